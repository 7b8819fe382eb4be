//! Client identity.

/// A client identity value object.
///
/// The numeric id is the sole identity and equality key. Clients are
/// created lazily on first reference and never deleted.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Client {
    id: u64,
    // name, avatar URL, possibly other profile info later
}

impl Client {
    /// Create a client with the given id.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// The client id.
    pub fn id(&self) -> u64 {
        self.id
    }
}
