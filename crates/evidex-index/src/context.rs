//! Positional context around a ranked hit.

use evidex_core::types::{Chunk, SearchResult};
use evidex_core::Result;

use crate::store::ChunkStore;

/// Which neighbours may contribute context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextPolicy {
    /// Stop at the first neighbour from a different document.
    #[default]
    SameDocument,
    /// Use whatever sits next to the hit in storage order.
    Positional,
}

impl ContextPolicy {
    pub fn from_clamp_flag(clamp_to_document: bool) -> Self {
        if clamp_to_document {
            Self::SameDocument
        } else {
            Self::Positional
        }
    }
}

/// Fill `context_before`/`context_after` with up to `window` neighbouring
/// chunk texts on each side, oldest first, joined by single spaces.
///
/// A side with no usable neighbour stays `None`. The hit is located by its
/// `chunk_id`, which is its store position.
pub fn expand(
    store: &ChunkStore,
    mut result: SearchResult,
    window: usize,
    policy: ContextPolicy,
) -> Result<SearchResult> {
    if window == 0 {
        return Ok(result);
    }
    let position = result.chunk_id;
    let hit = store.get(position)?;
    let chunks = store.chunks();

    let accept = |c: &Chunk| {
        policy == ContextPolicy::Positional || c.source_document_id == hit.source_document_id
    };

    let mut before: Vec<&str> = (1..=window.min(position))
        .map(|i| &chunks[position - i])
        .take_while(|c| accept(*c))
        .map(|c| c.text.as_str())
        .collect();
    before.reverse();

    let after: Vec<&str> = chunks[position + 1..]
        .iter()
        .take(window)
        .take_while(|c| accept(*c))
        .map(|c| c.text.as_str())
        .collect();

    result.context_before = join(&before);
    result.context_after = join(&after);
    Ok(result)
}

fn join(parts: &[&str]) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidex_core::types::ChunkRecord;
    use evidex_core::IndexError;

    fn store(docs: &[(&str, &str)]) -> ChunkStore {
        let chunks = docs
            .iter()
            .map(|(doc, text)| {
                ChunkRecord {
                    chunk_id: 0,
                    page_number: 1,
                    text: (*text).into(),
                    start_offset: 0,
                    end_offset: text.len(),
                }
                .attach(*doc)
            })
            .collect::<Vec<_>>();
        let vectors = vec![vec![1.0]; chunks.len()];
        let mut s = ChunkStore::new();
        s.append(chunks, vectors).unwrap();
        s
    }

    fn hit(store: &ChunkStore, position: usize) -> SearchResult {
        SearchResult::from_chunk(store.get(position).unwrap(), 0.5)
    }

    #[test]
    fn boundaries_and_interior() {
        let s = store(&[("a", "t0"), ("a", "t1"), ("a", "t2"), ("a", "t3"), ("a", "t4")]);

        let first = expand(&s, hit(&s, 0), 2, ContextPolicy::SameDocument).unwrap();
        assert_eq!(first.context_before, None);
        assert_eq!(first.context_after.as_deref(), Some("t1 t2"));

        let last = expand(&s, hit(&s, 4), 2, ContextPolicy::SameDocument).unwrap();
        assert_eq!(last.context_before.as_deref(), Some("t2 t3"));
        assert_eq!(last.context_after, None);

        let mid = expand(&s, hit(&s, 2), 2, ContextPolicy::SameDocument).unwrap();
        assert_eq!(mid.context_before.as_deref(), Some("t0 t1"));
        assert_eq!(mid.context_after.as_deref(), Some("t3 t4"));
    }

    #[test]
    fn partial_window_uses_what_exists() {
        let s = store(&[("a", "t0"), ("a", "t1"), ("a", "t2")]);
        let r = expand(&s, hit(&s, 1), 5, ContextPolicy::SameDocument).unwrap();
        assert_eq!(r.context_before.as_deref(), Some("t0"));
        assert_eq!(r.context_after.as_deref(), Some("t2"));
    }

    #[test]
    fn same_document_policy_stops_at_boundary() {
        let s = store(&[("a", "a0"), ("a", "a1"), ("b", "b0"), ("b", "b1")]);
        let clamped = expand(&s, hit(&s, 2), 2, ContextPolicy::SameDocument).unwrap();
        assert_eq!(clamped.context_before, None);
        assert_eq!(clamped.context_after.as_deref(), Some("b1"));

        let leaky = expand(&s, hit(&s, 2), 2, ContextPolicy::Positional).unwrap();
        assert_eq!(leaky.context_before.as_deref(), Some("a0 a1"));
    }

    #[test]
    fn zero_window_leaves_result_alone() {
        let s = store(&[("a", "t0"), ("a", "t1")]);
        let r = expand(&s, hit(&s, 0), 0, ContextPolicy::Positional).unwrap();
        assert_eq!(r.context_after, None);
    }

    #[test]
    fn stale_position_is_out_of_range() {
        let s = store(&[("a", "t0")]);
        let mut r = hit(&s, 0);
        r.chunk_id = 7;
        assert!(matches!(
            expand(&s, r, 1, ContextPolicy::Positional),
            Err(IndexError::IndexOutOfRange { position: 7, size: 1 })
        ));
    }
}
