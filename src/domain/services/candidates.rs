use crate::domain::model::{AnnotationItem, CharacterEntry, NONE_OF_THE_ABOVE};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use std::collections::HashSet;

/// Uniform sample without replacement. Asking for at least `items.len()`
/// returns every item in its original order.
pub fn sample<T: Clone, R: Rng + ?Sized>(items: &[T], amount: usize, rng: &mut R) -> Vec<T> {
    if amount >= items.len() {
        return items.to_vec();
    }
    index::sample(rng, items.len(), amount)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}

/// Builds the shuffled candidate list shown to annotators.
#[derive(Debug, Clone, Copy)]
pub struct CandidateBuilder {
    pool_size: usize,
    include_none_option: bool,
}

impl CandidateBuilder {
    pub fn new(pool_size: usize, include_none_option: bool) -> Self {
        Self {
            pool_size,
            include_none_option,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// 真實關鍵字加上干擾項，洗牌後視需要附加「None of the above」
    pub fn build<R: Rng + ?Sized>(
        &self,
        id: &str,
        true_keywords: &[String],
        keyword_pool: &[String],
        rng: &mut R,
    ) -> Vec<String> {
        let mut candidates = if true_keywords.len() > self.pool_size {
            tracing::warn!(
                "Character {} has {} keywords, truncating to {}",
                id,
                true_keywords.len(),
                self.pool_size
            );
            sample(true_keywords, self.pool_size, rng)
        } else {
            let needed = self.pool_size - true_keywords.len();
            let own: HashSet<&str> = true_keywords.iter().map(String::as_str).collect();
            let possible: Vec<String> = keyword_pool
                .iter()
                .filter(|k| !own.contains(k.as_str()))
                .cloned()
                .collect();

            let mut candidates = true_keywords.to_vec();
            candidates.extend(sample(&possible, needed, rng));
            candidates
        };

        candidates.shuffle(rng);

        if self.include_none_option {
            candidates.push(NONE_OF_THE_ABOVE.to_string());
        }

        candidates
    }

    pub fn build_item<R: Rng + ?Sized>(
        &self,
        entry: &CharacterEntry,
        keyword_pool: &[String],
        rng: &mut R,
    ) -> AnnotationItem {
        AnnotationItem {
            id: entry.id.clone(),
            text: entry.display_text(),
            candidates: self.build(&entry.id, &entry.model_keywords, keyword_pool, rng),
            model_keywords: entry.model_keywords.clone(),
        }
    }
}
