//! The built-in word-count client: the job the stock binary runs.

use crate::closure_mr::ClosureMapReducer;
use crate::error::{Error, Result};
use crate::record_types::{Emitter, MultiRecord, Pair};

/// Splits the value into words (maximal runs of alphanumeric
/// characters, lowercased) and emits (word, "1") for each.
pub fn map(out: &mut Emitter, record: Pair) -> Result<()> {
    for token in record.value.split_whitespace() {
        let word: String = token
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();
        if !word.is_empty() {
            out.emit(word, "1");
        }
    }
    Ok(())
}

/// Sums the integer counts of one word.
pub fn reduce(out: &mut Emitter, group: MultiRecord) -> Result<()> {
    let key = group.key().to_owned();
    let mut count: u64 = 0;
    for value in group {
        count += value
            .parse::<u64>()
            .map_err(|e| Error::User(format!("word count got {:?}: {}", value, e)))?;
    }
    out.emit(key, count.to_string());
    Ok(())
}

pub fn client() -> ClosureMapReducer {
    ClosureMapReducer::new(map, reduce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper_normalizes_words() {
        let mut out = Emitter::new();
        map(&mut out, Pair::new("3", "It's DONE -- done!")).unwrap();
        let words: Vec<String> = out.into_pairs().into_iter().map(|p| p.key).collect();
        assert_eq!(words, vec!["its", "done", "done"]);
    }

    #[test]
    fn reducer_sums_counts() {
        let mut out = Emitter::new();
        let group = MultiRecord::new("done".into(), vec!["1".into(), "1".into(), "2".into()]);
        reduce(&mut out, group).unwrap();
        let pairs = out.into_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0], Pair::new("done", "4"));
    }

    #[test]
    fn reducer_rejects_garbage_counts() {
        let mut out = Emitter::new();
        let group = MultiRecord::new("w".into(), vec!["one".into()]);
        assert!(matches!(reduce(&mut out, group), Err(Error::User(_))));
    }
}
