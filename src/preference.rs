use num_traits::Float;

use crate::ClusterError;

/// Preference is the value representing the degree to which a data point will act as its own exemplar,
/// with lower (more negative) values yielding fewer clusters.
///
/// - Median: Use median similarity value as preference
/// - List: Use provided preference list, one value per item
/// - Value: Assign all members the same preference value
#[derive(Debug, Clone, PartialEq)]
pub enum Preference<F>
where
    F: Float + Send + Sync,
{
    Median,
    List(Vec<F>),
    Value(F),
}

impl<F> Preference<F>
where
    F: Float + Send + Sync,
{
    /// Check the preference against a collection of `items` members
    pub fn validate(&self, items: usize) -> Result<(), ClusterError> {
        match self {
            Preference::Median => Ok(()),
            Preference::Value(pref) if pref.is_nan() => {
                Err(ClusterError::invalid_argument("preference must be a number"))
            }
            Preference::Value(_) => Ok(()),
            Preference::List(prefs) if prefs.len() != items => {
                Err(ClusterError::invalid_argument(format!(
                    "preference list has {} values for {} items",
                    prefs.len(),
                    items
                )))
            }
            Preference::List(prefs) => match prefs.iter().position(|p| p.is_nan()) {
                Some(idx) => Err(ClusterError::invalid_argument(format!(
                    "preference for item {} must be a number",
                    idx
                ))),
                None => Ok(()),
            },
        }
    }
}

impl<F> Default for Preference<F>
where
    F: Float + Send + Sync,
{
    fn default() -> Self {
        Preference::Median
    }
}
