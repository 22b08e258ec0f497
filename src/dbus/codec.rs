// Netwatch - Property Value Codec
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Typed access to loosely-typed D-Bus values.
//!
//! Signals and `GetSettings` replies carry `a{sv}` maps whose values may be
//! missing or of an unexpected type. Every accessor here returns `None` in
//! that case; callers treat it as "field not present" rather than an error.

use std::collections::HashMap;

use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

/// A property map as found in `PropertiesChanged` and settings sections.
pub type PropertyMap = HashMap<String, OwnedValue>;

/// Decode a value into `T`, looking through variant-in-variant wrapping.
pub fn decode<'v, T>(value: &Value<'v>) -> Option<T>
where
    T: TryFrom<Value<'v>>,
{
    let value = match value {
        Value::Value(inner) => inner.as_ref(),
        other => other,
    };
    let value = value.try_clone().ok()?;
    T::try_from(value).ok()
}

pub fn as_u32(value: &Value<'_>) -> Option<u32> {
    match value {
        Value::U32(v) => Some(*v),
        Value::Value(inner) => as_u32(inner),
        _ => None,
    }
}

pub fn as_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(v) => Some(*v),
        Value::Value(inner) => as_bool(inner),
        _ => None,
    }
}

/// Strings and object paths both decode to `String`.
pub fn as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::ObjectPath(p) => Some(p.as_str().to_string()),
        Value::Value(inner) => as_string(inner),
        _ => None,
    }
}

pub fn as_object_paths(value: &Value<'_>) -> Option<Vec<OwnedObjectPath>> {
    decode::<Vec<OwnedObjectPath>>(value)
}

pub fn as_string_list(value: &Value<'_>) -> Option<Vec<String>> {
    decode::<Vec<String>>(value)
}

pub fn as_property_map(value: &Value<'_>) -> Option<PropertyMap> {
    decode::<PropertyMap>(value)
}

/// Typed getters over a property map.
pub trait PropertyMapExt {
    fn get_u32(&self, key: &str) -> Option<u32>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_object_paths(&self, key: &str) -> Option<Vec<OwnedObjectPath>>;
    fn get_string_list(&self, key: &str) -> Option<Vec<String>>;
}

impl PropertyMapExt for PropertyMap {
    fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| as_u32(v))
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| as_bool(v))
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| as_string(v))
    }

    fn get_object_paths(&self, key: &str) -> Option<Vec<OwnedObjectPath>> {
        self.get(key).and_then(|v| as_object_paths(v))
    }

    fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(|v| as_string_list(v))
    }
}

/// Convert a borrowed value into an owned one, for building signal bodies.
pub fn to_owned_value(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

/// Object paths NetworkManager uses to mean "no object".
pub fn is_object_path_valid(path: &str) -> bool {
    !path.is_empty() && path != "/"
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::ObjectPath;

    fn owned(value: Value<'_>) -> OwnedValue {
        to_owned_value(value).unwrap()
    }

    #[test]
    fn test_scalar_decoding() {
        let mut map = PropertyMap::new();
        map.insert("State".into(), owned(Value::from(2u32)));
        map.insert("Vpn".into(), owned(Value::from(true)));
        map.insert("Uuid".into(), owned(Value::from("1234")));

        assert_eq!(map.get_u32("State"), Some(2));
        assert_eq!(map.get_bool("Vpn"), Some(true));
        assert_eq!(map.get_string("Uuid").as_deref(), Some("1234"));
    }

    #[test]
    fn test_type_mismatch_yields_none() {
        let mut map = PropertyMap::new();
        map.insert("State".into(), owned(Value::from("activated")));
        map.insert("Vpn".into(), owned(Value::from(1u32)));

        assert_eq!(map.get_u32("State"), None);
        assert_eq!(map.get_bool("Vpn"), None);
        assert_eq!(map.get_u32("Missing"), None);
        assert_eq!(map.get_object_paths("State"), None);
    }

    #[test]
    fn test_object_path_list() {
        let paths = vec![
            ObjectPath::try_from("/org/freedesktop/NetworkManager/Devices/1").unwrap(),
            ObjectPath::try_from("/org/freedesktop/NetworkManager/Devices/2").unwrap(),
        ];
        let mut map = PropertyMap::new();
        map.insert("Devices".into(), owned(Value::from(paths)));

        let decoded = map.get_object_paths("Devices").unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].as_str(), "/org/freedesktop/NetworkManager/Devices/2");
    }

    #[test]
    fn test_nested_variant() {
        let value = Value::Value(Box::new(Value::from(7u32)));
        assert_eq!(as_u32(&value), Some(7));
    }

    #[test]
    fn test_object_path_validity() {
        assert!(!is_object_path_valid("/"));
        assert!(!is_object_path_valid(""));
        assert!(is_object_path_valid("/org/freedesktop/NetworkManager/IP4Config/3"));
    }
}
