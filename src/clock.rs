// Time source for the limiter - injectable so tests can advance time
// without sleeping

pub trait Clock: Send + Sync {
    // current time as unix epoch milliseconds
    fn now_ms(&self) -> i64;
}

// Production clock backed by the system wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
