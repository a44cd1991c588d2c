#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer<T> {
    id: TimerId,
    deadline: f64,
    task: T,
}

/// Pending callbacks keyed by a deadline in host milliseconds.
///
/// The host moves time forward with `advance_to`; due tasks are popped in
/// deadline order (ties in scheduling order). While a task runs, "now" is
/// that task's deadline, so a task that reschedules itself keeps a fixed
/// cadence even when the host delivers frames late.
pub struct TimerQueue<T> {
    next_id: u64,
    clock: f64,
    horizon: f64,
    timers: Vec<Timer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            clock: 0.0,
            horizon: 0.0,
            timers: Vec::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn advance_to(&mut self, now: f64) {
        if now > self.horizon {
            self.horizon = now;
        }
    }

    /// Brings the clock up to the host time once due tasks are drained.
    pub fn settle(&mut self) {
        self.clock = self.horizon;
    }

    pub fn schedule(&mut self, delay_ms: f64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            deadline: self.clock + delay_ms.max(0.0),
            task,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn pop_due(&mut self) -> Option<T> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= self.horizon)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then_with(|| a.id.0.cmp(&b.id.0))
            })
            .map(|(index, _)| index)?;

        let timer = self.timers.swap_remove(index);
        if timer.deadline > self.clock {
            self.clock = timer.deadline;
        }
        Some(timer.task)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>, now: f64) -> Vec<&'static str> {
        queue.advance_to(now);
        let mut fired = Vec::new();
        while let Some(task) = queue.pop_due() {
            fired.push(task);
        }
        queue.settle();
        fired
    }

    #[test]
    fn tasks_fire_in_deadline_then_schedule_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(300.0, "remove");
        queue.schedule(10.0, "show");
        queue.schedule(10.0, "second-show");

        assert_eq!(drain(&mut queue, 5.0), Vec::<&str>::new());
        assert_eq!(drain(&mut queue, 10.0), vec!["show", "second-show"]);
        assert_eq!(drain(&mut queue, 1_000.0), vec!["remove"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let dismiss = queue.schedule(5_000.0, "dismiss");
        queue.schedule(5_000.0, "other");

        assert!(queue.cancel(dismiss));
        assert!(!queue.cancel(dismiss));
        assert_eq!(drain(&mut queue, 6_000.0), vec!["other"]);
    }

    #[test]
    fn rescheduling_during_catch_up_keeps_cadence() {
        let mut queue: TimerQueue<u32> = TimerQueue::new();
        queue.schedule(16.0, 1);
        queue.advance_to(100.0);

        let mut ticks = Vec::new();
        while let Some(tick) = queue.pop_due() {
            ticks.push((tick, queue.now()));
            queue.schedule(16.0, tick + 1);
        }
        queue.settle();

        assert_eq!(ticks.len(), 6);
        assert_eq!(ticks.last().map(|(_, at)| *at), Some(96.0));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.now(), 100.0);
    }

    #[test]
    fn time_never_moves_backwards() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        queue.advance_to(50.0);
        queue.settle();
        queue.advance_to(20.0);
        queue.settle();
        assert_eq!(queue.now(), 50.0);
    }
}
