use crate::instance::Instance;
use crate::{AsshError, Result};

/// Resolve a free-text query to exactly one instance.
///
/// Ambiguity is a hard error rather than "take the first match": connecting
/// to the wrong instance is a worse failure mode than retyping a narrower
/// query.
pub fn resolve<'a>(instances: &'a [Instance], query: &str) -> Result<&'a Instance> {
    let matched: Vec<&Instance> = instances.iter().filter(|i| i.matches(query)).collect();

    match matched.as_slice() {
        [] => Err(AsshError::NoMatch(query.to_string())),
        [instance] => Ok(instance),
        many => Err(AsshError::AmbiguousQuery {
            query: query.to_string(),
            count: many.len(),
        }),
    }
}
