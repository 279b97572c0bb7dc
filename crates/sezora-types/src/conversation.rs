use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a hyphenated UUID string.
const ID_LEN: usize = 36;

/// Identity of a two-party conversation: both participant ids, sorted and
/// joined with `-`.
///
/// `between` is the only way to build one from user ids. Keys arriving from
/// requests or rows go through `FromStr`, which accepts only the canonical
/// form `between` produces, so the same pair can never end up under two
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid conversation id '{0}'")]
pub struct InvalidConversationId(pub String);

impl ConversationId {
    /// Derive the conversation key for a pair of users. Symmetric in its
    /// arguments.
    pub fn between(a: Uuid, b: Uuid) -> Self {
        let mut ids = [a.to_string(), b.to_string()];
        ids.sort();
        Self(ids.join("-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two participants, in key order.
    pub fn participants(&self) -> (Uuid, Uuid) {
        // Both halves were validated on construction.
        let (first, second) = split_key(&self.0).unwrap_or_default();
        (first, second)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        let (first, second) = self.participants();
        first == user_id || second == user_id
    }

    /// The participant that isn't `user_id`, if `user_id` is one of them.
    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        let (first, second) = self.participants();
        if first == user_id {
            Some(second)
        } else if second == user_id {
            Some(first)
        } else {
            None
        }
    }
}

fn split_key(key: &str) -> Option<(Uuid, Uuid)> {
    if key.len() != ID_LEN * 2 + 1 || key.as_bytes()[ID_LEN] != b'-' {
        return None;
    }
    let (first, rest) = key.split_at(ID_LEN);
    let second = &rest[1..];

    let a: Uuid = first.parse().ok()?;
    let b: Uuid = second.parse().ok()?;
    Some((a, b))
}

impl FromStr for ConversationId {
    type Err = InvalidConversationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = split_key(s).ok_or_else(|| InvalidConversationId(s.to_string()))?;
        let canonical = Self::between(a, b);
        if canonical.0 != s {
            return Err(InvalidConversationId(s.to_string()));
        }
        Ok(canonical)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = InvalidConversationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn derivation_is_symmetric() {
        for pair in ids(40).chunks(2) {
            assert_eq!(
                ConversationId::between(pair[0], pair[1]),
                ConversationId::between(pair[1], pair[0])
            );
        }
    }

    #[test]
    fn derivation_is_sorted_join() {
        let a: Uuid = "00000000-0000-0000-0000-00000000000b".parse().unwrap();
        let b: Uuid = "00000000-0000-0000-0000-00000000000a".parse().unwrap();
        assert_eq!(
            ConversationId::between(a, b).as_str(),
            "00000000-0000-0000-0000-00000000000a-00000000-0000-0000-0000-00000000000b"
        );
    }

    #[test]
    fn distinct_pairs_get_distinct_keys() {
        let users = ids(8);
        let mut seen = std::collections::HashMap::new();
        for (i, a) in users.iter().enumerate() {
            for b in &users[i..] {
                let key = ConversationId::between(*a, *b);
                if let Some(previous) = seen.insert(key.clone(), (*a, *b)) {
                    panic!("{key} produced by {previous:?} and {:?}", (*a, *b));
                }
            }
        }
    }

    #[test]
    fn participants_recovers_the_pair() {
        let users = ids(2);
        let id = ConversationId::between(users[0], users[1]);
        let (first, second) = id.participants();
        let mut expected = [users[0], users[1]];
        expected.sort();
        assert_eq!([first, second], expected);
        assert!(id.involves(users[0]));
        assert_eq!(id.other_participant(users[0]), Some(users[1]));
        assert_eq!(id.other_participant(Uuid::new_v4()), None);
    }

    #[test]
    fn parse_accepts_only_canonical_keys() {
        let users = ids(2);
        let id = ConversationId::between(users[0], users[1]);
        assert_eq!(id.as_str().parse::<ConversationId>(), Ok(id.clone()));

        let (first, second) = id.participants();
        let reversed = format!("{second}-{first}");
        if first != second {
            assert!(reversed.parse::<ConversationId>().is_err());
        }
        assert!(id.as_str().to_uppercase().parse::<ConversationId>().is_err());
        assert!("abc-def".parse::<ConversationId>().is_err());
        assert!("".parse::<ConversationId>().is_err());
    }

    #[test]
    fn serde_validates_keys() {
        let users = ids(2);
        let id = ConversationId::between(users[0], users[1]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<ConversationId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<ConversationId>("\"not-a-key\"").is_err());
    }
}
