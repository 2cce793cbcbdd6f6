// Snake draft model: positions, rosters, and the pick state machine.

pub mod pick;
pub mod roster;
pub mod state;
