use uuid::Uuid;

/// Source of fresh identifiers for records and pages.
pub trait IdSource: Send {
    fn next_id(&mut self) -> String;
}

/// Random (v4) UUIDs in lowercase hyphenated form, as the device uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> IdSource for F
where
    F: FnMut() -> String + Send,
{
    fn next_id(&mut self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_source_yields_distinct_v4_ids() {
        let mut source = UuidSource;
        let ids: HashSet<String> = (0..100).map(|_| source.next_id()).collect();
        assert_eq!(ids.len(), 100);
        for id in &ids {
            let parsed = Uuid::parse_str(id).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
            assert_eq!(id, &id.to_lowercase());
        }
    }

    #[test]
    fn closures_are_id_sources() {
        let mut n = 0;
        let mut counter = move || {
            n += 1;
            format!("id-{n}")
        };
        assert_eq!(counter.next_id(), "id-1");
        assert_eq!(counter.next_id(), "id-2");
    }
}
