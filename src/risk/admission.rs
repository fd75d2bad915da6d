use crate::models::position::PositionBook;
use crate::models::signal::Direction;

/// True only while fewer than `max_per_direction` positions are open in
/// `direction`. The opposite side is not considered.
pub fn admit(book: &PositionBook, direction: Direction, max_per_direction: usize) -> bool {
    book.count(direction) < max_per_direction
}
