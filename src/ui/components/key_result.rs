/// Outcome of offering a key to an overlay component.
///
/// The app tries each active overlay in turn and only falls through to the
/// tree keys on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the app to do
  Handled,
  /// Consumed, with an event for the app
  Event(T),
  /// Not consumed
  NotHandled,
}
