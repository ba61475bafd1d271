/// Result of one unit of batch work.
///
/// A batch keeps going past `Skipped` units and counts them; a `Fatal`
/// unit stops the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Ok(T),
    Skipped(E),
    Fatal(E),
}

impl<T, E> Outcome<T, E> {
    /// Sorts an error into `Skipped` or `Fatal` with `is_fatal`.
    pub fn classify(result: Result<T, E>, is_fatal: impl FnOnce(&E) -> bool) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(err) if is_fatal(&err) => Outcome::Fatal(err),
            Err(err) => Outcome::Skipped(err),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }
}
