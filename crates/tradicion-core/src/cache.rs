//! Request-scoped memo of deed lookups.

use std::collections::HashMap;

use tracing::debug;

use crate::annotation::ResolveDeed;
use crate::record::{AnnotationNumber, DeedReference};

/// Remembers the outcome of every annotation lookup made during one run,
/// misses included, so the certificate is scanned at most once per number.
///
/// A cache is built by the orchestrator for a single request and dropped with
/// it. It is never shared between requests.
pub struct DeedCache<'r, R: ResolveDeed + ?Sized> {
    resolver: &'r R,
    entries: HashMap<AnnotationNumber, Option<DeedReference>>,
    resolutions: usize,
}

impl<'r, R: ResolveDeed + ?Sized> DeedCache<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self {
            resolver,
            entries: HashMap::new(),
            resolutions: 0,
        }
    }

    pub fn get_or_resolve(&mut self, number: &AnnotationNumber) -> Option<DeedReference> {
        if let Some(cached) = self.entries.get(number) {
            debug!(annotation = %number, found = cached.is_some(), "deed cache hit");
            return cached.clone();
        }
        let resolved = self.resolver.find_deed(number);
        self.resolutions += 1;
        debug!(annotation = %number, found = resolved.is_some(), "deed cache miss");
        self.entries.insert(number.clone(), resolved.clone());
        resolved
    }

    /// How many times the underlying resolver has been called.
    pub fn resolutions(&self) -> usize {
        self.resolutions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::annotation::AnnotationResolver;

    /// Records every number it is asked about.
    struct CountingResolver {
        calls: RefCell<Vec<String>>,
    }

    impl CountingResolver {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls_for(&self, number: &str) -> usize {
            self.calls.borrow().iter().filter(|n| *n == number).count()
        }
    }

    impl ResolveDeed for CountingResolver {
        fn find_deed(&self, number: &AnnotationNumber) -> Option<DeedReference> {
            self.calls.borrow_mut().push(number.to_string());
            (number.as_str() == "003")
                .then(|| DeedReference::new("ESCRITURA 4067 DEL 16-09-2022".into()))
        }
    }

    fn n(s: &str) -> AnnotationNumber {
        AnnotationNumber::parse(s).unwrap()
    }

    #[test]
    fn resolves_each_number_once() {
        let resolver = CountingResolver::new();
        let mut cache = DeedCache::new(&resolver);
        let results: Vec<_> = (0..5).map(|_| cache.get_or_resolve(&n("003"))).collect();

        assert_eq!(resolver.calls_for("003"), 1);
        assert_eq!(cache.resolutions(), 1);
        assert!(results.iter().all(|r| r == &results[0]));
        assert_eq!(
            results[0].as_ref().map(DeedReference::as_str),
            Some("ESCRITURA 4067 DEL 16-09-2022")
        );
    }

    #[test]
    fn misses_are_cached_too() {
        let resolver = CountingResolver::new();
        let mut cache = DeedCache::new(&resolver);
        assert_eq!(cache.get_or_resolve(&n("009")), None);
        assert_eq!(cache.get_or_resolve(&n("9")), None);
        assert_eq!(resolver.calls_for("009"), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_numbers_resolve_separately() {
        let resolver = CountingResolver::new();
        let mut cache = DeedCache::new(&resolver);
        cache.get_or_resolve(&n("001"));
        cache.get_or_resolve(&n("002"));
        cache.get_or_resolve(&n("001"));
        assert_eq!(cache.resolutions(), 2);
        assert_eq!(resolver.calls.borrow().len(), 2);
    }

    #[test]
    fn works_over_certificate_resolver() {
        let text = "ANOTACION: Nro 003 Fecha: 20-09-2022\nDoc: ESCRITURA 4067 DEL 16-09-2022 NOTARIA";
        let resolver = AnnotationResolver::new(text);
        let mut cache = DeedCache::new(&resolver);
        assert!(cache.is_empty());
        assert!(cache.get_or_resolve(&n("003")).is_some());
        assert!(cache.get_or_resolve(&n("004")).is_none());
        assert_eq!(cache.len(), 2);
    }
}
