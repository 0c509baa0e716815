use schem_common::{Result, SchemError};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A block identifier split into its name and ordered `key=value` properties,
/// as written in `minecraft:oak_stairs[facing=east,half=bottom]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub name: String,
    pub properties: Vec<(String, String)>,
}

/// Adds the default namespace to bare names.
pub fn namespaced(name: &str) -> Cow<'_, str> {
    if name.contains(':') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("minecraft:{}", name))
    }
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        BlockState {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| SchemError::invalid("block_state", format!("'{}': {}", input, reason));

        let (name, properties) = match input.find('[') {
            None => (input, None),
            Some(start) => {
                let inner = input[start + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("missing closing ']'"))?;
                (&input[..start], Some(inner))
            }
        };

        if name.is_empty() || name.contains(']') {
            return Err(invalid("bad block name"));
        }

        let mut state = BlockState::new(name);
        if let Some(inner) = properties.filter(|p| !p.is_empty()) {
            for pair in inner.split(',') {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| invalid("property without '='"))?;
                if key.is_empty() || state.get(key).is_some() {
                    return Err(invalid("empty or repeated property key"));
                }
                state.properties.push((key.to_owned(), value.to_owned()));
            }
        }
        Ok(state)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value in place, or appends a new property.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.properties.push((key.to_owned(), value)),
        }
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }
}

impl FromStr for BlockState {
    type Err = SchemError;

    fn from_str(s: &str) -> Result<Self> {
        BlockState::parse(s)
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_and_format_keep_property_order() {
        let input = "minecraft:oak_stairs[half=bottom,facing=east,waterlogged=false]";
        let state = BlockState::parse(input).unwrap();

        assert_eq!(state.name, "minecraft:oak_stairs");
        assert_eq!(state.get("facing"), Some("east"));
        assert_eq!(state.properties[0].0, "half");
        assert_eq!(state.to_string(), input);
    }

    #[test]
    fn test_plain_name() {
        let state: BlockState = "stone".parse().unwrap();
        assert_eq!(state, BlockState::new("stone"));
        assert!(!state.has_properties());
        assert_eq!(BlockState::parse("minecraft:stone[]").unwrap().to_string(), "minecraft:stone");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut state = BlockState::parse("minecraft:lever[face=wall,facing=north]").unwrap();
        state.set("facing", "south");
        assert_eq!(state.to_string(), "minecraft:lever[face=wall,facing=south]");
    }

    #[test]
    fn test_malformed() {
        assert_matches!(BlockState::parse("stone[facing=east"), Err(SchemError::InvalidValue { .. }));
        assert_matches!(BlockState::parse("stone[facing]"), Err(SchemError::InvalidValue { .. }));
        assert_matches!(BlockState::parse("[a=b]"), Err(SchemError::InvalidValue { .. }));
        assert_matches!(BlockState::parse("stone[a=b,a=c]"), Err(SchemError::InvalidValue { .. }));
    }

    #[test]
    fn test_whitespace_is_kept_verbatim() {
        let spaced = BlockState::parse("minecraft:oak_log[ axis=x]").unwrap();
        assert_eq!(spaced.get(" axis"), Some("x"));
        assert_eq!(spaced.get("axis"), None);
        assert_eq!(spaced.to_string(), "minecraft:oak_log[ axis=x]");
        assert_ne!(spaced, BlockState::parse("minecraft:oak_log[axis=x]").unwrap());
    }

    #[test]
    fn test_namespaced() {
        assert_eq!(namespaced("stone"), "minecraft:stone");
        assert_eq!(namespaced("mod:thing"), "mod:thing");
    }
}
