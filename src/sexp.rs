//! S-expression plist helpers shared by config loading, replay parsing and
//! event output.

use lexpr::Value;

/// Escape a string for inclusion in a double-quoted s-expression string.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a boolean the Lisp way.
pub fn bool_sexp(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}

/// Look up the value following `:key` in a plist.
///
/// Accepts both keyword syntax (`#:key`) and the Emacs-style `:key` symbol.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a plist value as a string.  Keywords lose their leading colon.
pub fn get_string(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => bool_sexp(*b).to_string(),
        Value::Null => "nil".to_string(),
        _ => val.to_string(),
    })
}

/// Extract a floating-point value from a plist.
pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_value(value, key).and_then(as_f64)
}

/// Extract a non-negative integer value from a plist.
pub fn get_u32(value: &Value, key: &str) -> Option<u32> {
    match get_value(value, key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}

/// Numeric value of a leaf, integers included.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Elements of a proper list, without descending into nested lists.
/// `()` yields no elements; a non-list yields `None`.
pub fn list_items(value: &Value) -> Option<Vec<&Value>> {
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Null => return Some(items),
            _ => return None,
        }
    }
}

/// Format an event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hello"), "hello");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_get_string_keyword_and_string() {
        let v = lexpr::from_str("(:mode :video :name \"Right\")").unwrap();
        assert_eq!(get_string(&v, "mode"), Some("video".to_string()));
        assert_eq!(get_string(&v, "name"), Some("Right".to_string()));
        assert_eq!(get_string(&v, "missing"), None);
    }

    #[test]
    fn test_get_float_accepts_integers() {
        let v = lexpr::from_str("(:a 0.25 :b 2 :c :x)").unwrap();
        assert_eq!(get_float(&v, "a"), Some(0.25));
        assert_eq!(get_float(&v, "b"), Some(2.0));
        assert_eq!(get_float(&v, "c"), None);
    }

    #[test]
    fn test_get_u32() {
        let v = lexpr::from_str("(:n 3 :neg -1 :f 1.5)").unwrap();
        assert_eq!(get_u32(&v, "n"), Some(3));
        assert_eq!(get_u32(&v, "neg"), None);
        assert_eq!(get_u32(&v, "f"), None);
    }

    #[test]
    fn test_key_without_value() {
        let v = lexpr::from_str("(:a 1 :dangling)").unwrap();
        assert!(get_value(&v, "dangling").is_none());
    }

    #[test]
    fn test_list_items_keeps_nesting() {
        let v = lexpr::from_str("((1 2 3) (4 5 6))").unwrap();
        let items = list_items(&v).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(list_items(items[1]).unwrap().len(), 3);

        let empty = lexpr::from_str("()").unwrap();
        assert_eq!(list_items(&empty).map(|i| i.len()), Some(0));

        let atom = lexpr::from_str("42").unwrap();
        assert!(list_items(&atom).is_none());
    }

    #[test]
    fn test_format_event_is_valid_sexp() {
        let e = format_event("scroll-by", &[("dx", "12.0"), ("dy", "0.0")]);
        assert_eq!(e, "(:type :event :event :scroll-by :dx 12.0 :dy 0.0)");
        assert!(lexpr::from_str(&e).is_ok());
    }
}
