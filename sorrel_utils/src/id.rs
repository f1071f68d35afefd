use ulid::Ulid;
use uuid::Uuid;

/// Produces new lexicographically sortable ID
pub fn generate_ulid() -> Uuid {
    let ulid = Ulid::new();
    Uuid::from(ulid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_1 = generate_ulid();
        let id_2 = generate_ulid();
        assert_ne!(id_1, id_2);
    }
}
