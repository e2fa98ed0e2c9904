//! Builders for standard tags.

/// A standard tag, convertible to the wire form (`Vec<String>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `["e", <event id>, <relay>, <marker>]`
    Event {
        id: String,
        relay: String,
        marker: String,
    },
    /// `["p", <pubkey>, <relay>, <petname>]`
    Person {
        pubkey: String,
        relay: String,
        petname: String,
    },
    /// `["a", "<kind>:<pubkey>:<d>", <relay>]`
    Address {
        kind: u16,
        pubkey: String,
        identifier: String,
        relay: String,
    },
    /// `["t", <hashtag>]`
    Hashtag(String),
    /// `["r", <reference>]`
    Reference(String),
    /// `["d", <identifier>]`
    Identifier(String),
    /// `["subject", <subject>]` (NIP-14)
    Subject(String),
    /// `["title", <title>]`
    Title(String),
    /// `["expiration", <unix seconds>]` (NIP-40)
    Expiration(u64),
}

impl Tag {
    pub fn event(id: impl Into<String>) -> Self {
        Tag::Event {
            id: id.into(),
            relay: String::new(),
            marker: String::new(),
        }
    }

    /// Event reference with a relay hint and `root`/`reply`/`mention` marker.
    pub fn event_marked(
        id: impl Into<String>,
        relay: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Tag::Event {
            id: id.into(),
            relay: relay.into(),
            marker: marker.into(),
        }
    }

    pub fn person(pubkey: impl Into<String>) -> Self {
        Tag::Person {
            pubkey: pubkey.into(),
            relay: String::new(),
            petname: String::new(),
        }
    }

    pub fn hashtag(tag: impl Into<String>) -> Self {
        Tag::Hashtag(tag.into())
    }

    /// Tag name (first element).
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Event { .. } => "e",
            Tag::Person { .. } => "p",
            Tag::Address { .. } => "a",
            Tag::Hashtag(_) => "t",
            Tag::Reference(_) => "r",
            Tag::Identifier(_) => "d",
            Tag::Subject(_) => "subject",
            Tag::Title(_) => "title",
            Tag::Expiration(_) => "expiration",
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        let name = self.name().to_string();
        match self {
            Tag::Event { id, relay, marker } => {
                vec![name, id.clone(), relay.clone(), marker.clone()]
            }
            Tag::Person {
                pubkey,
                relay,
                petname,
            } => vec![name, pubkey.clone(), relay.clone(), petname.clone()],
            Tag::Address {
                kind,
                pubkey,
                identifier,
                relay,
            } => vec![
                name,
                format!("{}:{}:{}", kind, pubkey, identifier),
                relay.clone(),
            ],
            Tag::Hashtag(value)
            | Tag::Reference(value)
            | Tag::Identifier(value)
            | Tag::Subject(value)
            | Tag::Title(value) => vec![name, value.clone()],
            Tag::Expiration(at) => vec![name, at.to_string()],
        }
    }
}

impl From<Tag> for Vec<String> {
    fn from(tag: Tag) -> Self {
        tag.to_vec()
    }
}
