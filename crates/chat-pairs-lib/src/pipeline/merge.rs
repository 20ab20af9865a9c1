use crate::config::ConcatOrder;
use crate::model::message::Message;
use crate::model::qa_pair::QaPair;
use crate::pipeline::window::ContextWindow;

/// Flatten one window into a question/answer pair.
///
/// Target-speaker messages form the answer, everything else the question.
/// Each message contributes its fragments joined by `"\n"`; messages on the
/// same side are joined with no separator. With [`ConcatOrder::AsStored`]
/// a side is read in window order, newest message first; with
/// [`ConcatOrder::Chronological`] it is read oldest first.
pub fn merge_window(window: &ContextWindow<'_>, order: ConcatOrder) -> QaPair {
    let (answer, question): (Vec<&Message>, Vec<&Message>) = window
        .messages()
        .iter()
        .copied()
        .partition(|m| m.sender.is_target());

    QaPair {
        question: concat_side(&question, order),
        answer: concat_side(&answer, order),
    }
}

fn concat_side(side: &[&Message], order: ConcatOrder) -> String {
    match order {
        ConcatOrder::AsStored => side.iter().map(|m| m.text()).collect(),
        ConcatOrder::Chronological => side.iter().rev().map(|m| m.text()).collect(),
    }
}

/// Lazily merge windows into pairs, preserving input order.
///
/// Callers pass windows oldest exchange first; the builder emits them newest
/// first, so they are normally reversed before reaching this stage.
pub fn merge_windows<'w>(
    windows: &'w [ContextWindow<'w>],
    order: ConcatOrder,
) -> impl Iterator<Item = QaPair> + 'w {
    windows.iter().map(move |w| merge_window(w, order))
}
