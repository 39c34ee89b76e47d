//! Pure edits of the local item list, applied after a successful response.

use crate::todos::model::TodoItem;

/// Replaces the item with the same id in place. Returns false if none matched.
pub fn replace_by_id(items: &mut [TodoItem], updated: TodoItem) -> bool {
    match items.iter_mut().find(|t| t.id == updated.id) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

/// Drops exactly the items with `id`, keeping the rest in order.
pub fn remove_by_id(items: &mut Vec<TodoItem>, id: i64) -> bool {
    let before = items.len();
    items.retain(|t| t.id != id);
    items.len() != before
}
