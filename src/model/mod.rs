pub mod task;
pub mod project;
pub mod chat;
pub mod workspace;
pub mod config;

pub use task::*;
pub use project::*;
pub use chat::*;
pub use workspace::*;
pub use config::*;

use uuid::Uuid;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 12;

/// Generate a random ID of the form `<kind>-<12 base36 chars>`
pub fn generate_id(kind: &str) -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
    for _ in 0..ID_SUFFIX_LEN {
        suffix.push(ID_ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("{}-{}", kind, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let ids: HashSet<String> = (0..200).map(|_| generate_id("task")).collect();
        assert_eq!(ids.len(), 200);
        for id in &ids {
            let suffix = id.strip_prefix("task-").unwrap();
            assert_eq!(suffix.len(), 12);
            assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }
}
