use wasm_bindgen::JsValue;

/// Error raised while wiring a behavior or talking to a browser API.
/// A missing anchor is never an error; see `behaviors::Wiring::Skipped`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeError(pub String);

pub type Result<T> = std::result::Result<T, ThemeError>;

impl ThemeError {
    pub fn new(msg: impl Into<String>) -> Self {
        ThemeError(msg.into())
    }
}

impl std::fmt::Display for ThemeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ThemeError {}

impl From<JsValue> for ThemeError {
    fn from(value: JsValue) -> Self {
        if let Some(s) = value.as_string() {
            return ThemeError(s);
        }
        match js_sys::JSON::stringify(&value) {
            Ok(s) => ThemeError(String::from(s)),
            Err(_) => ThemeError("unknown JavaScript error".into()),
        }
    }
}

impl From<serde_json::Error> for ThemeError {
    fn from(e: serde_json::Error) -> Self {
        ThemeError(format!("invalid JSON: {}", e))
    }
}

impl From<toml::de::Error> for ThemeError {
    fn from(e: toml::de::Error) -> Self {
        ThemeError(format!("invalid TOML: {}", e))
    }
}

impl From<regex::Error> for ThemeError {
    fn from(e: regex::Error) -> Self {
        ThemeError(format!("invalid pattern: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let e = ThemeError::new("clipboard unavailable");
        assert_eq!(e.to_string(), "clipboard unavailable");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: ThemeError = err.into();
        assert!(e.0.starts_with("invalid JSON"));
    }

    #[test]
    fn test_from_regex_error() {
        let err = regex::Regex::new("(").unwrap_err();
        let e: ThemeError = err.into();
        assert!(e.0.starts_with("invalid pattern"));
    }
}
