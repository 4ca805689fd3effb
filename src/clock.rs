use std::cell::Cell;
use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Monotonic time source used for bounded waits.
pub trait Clock {
	fn now(&self) -> Instant;

	// sleep for (at least) `duration`
	fn sleep(&mut self, duration: Duration);

	fn elapsed_since(&self, start: Instant) -> Duration {
		self.now().duration_since(start)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}

	fn sleep(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

/// Clock that only advances when slept on.
///
/// Lets simulations and tests run bounded waits without spending real time.
#[derive(Clone, Debug)]
pub struct ManualClock {
	origin: Instant,
	offset: Cell<Duration>,
}

impl ManualClock {
	pub fn new() -> Self {
		ManualClock {
			origin: Instant::now(),
			offset: Cell::new(Duration::from_secs(0)),
		}
	}

	pub fn advance(&self, duration: Duration) {
		self.offset.set(self.offset.get() + duration);
	}

	// total time slept/advanced since creation
	pub fn elapsed(&self) -> Duration {
		self.offset.get()
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		ManualClock::new()
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		self.origin + self.offset.get()
	}

	fn sleep(&mut self, duration: Duration) {
		self.advance(duration);
	}
}

impl<'a, C: Clock + ?Sized> Clock for &'a mut C {
	fn now(&self) -> Instant {
		C::now(*self)
	}

	fn sleep(&mut self, duration: Duration) {
		C::sleep(*self, duration)
	}
}
