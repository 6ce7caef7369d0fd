/// The Relay trait abstracts the cookie-like side channel shared between the
/// UI process and the stateless route guard.
///
/// Only the credential store writes to it; every other component reads.
pub trait Relay: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
}
