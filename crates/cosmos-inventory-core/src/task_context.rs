use std::cell::Cell;

use crate::models::TaskKind;

thread_local! {
    static CURRENT_TASK_KIND: Cell<Option<TaskKind>> = const { Cell::new(None) };
}

pub fn current_task_kind() -> Option<TaskKind> {
    CURRENT_TASK_KIND.with(Cell::get)
}

/// Puts the outer kind back when dropped, including during unwinding.
struct RestoreOnDrop {
    previous: Option<TaskKind>,
}

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        CURRENT_TASK_KIND.with(|slot| slot.set(self.previous));
    }
}

pub fn with_task_kind<R>(task: TaskKind, operation: impl FnOnce() -> R) -> R {
    let _restore = RestoreOnDrop {
        previous: CURRENT_TASK_KIND.with(|slot| slot.replace(Some(task))),
    };
    operation()
}
