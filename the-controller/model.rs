/// Document owned by a [`Controller`](crate::Controller).
///
/// The controller never looks inside the document beyond asking for the
/// sheet currently being edited.
pub trait DocModel {
  type Sheet;

  fn current_sheet_model(&self) -> &Self::Sheet;
}
