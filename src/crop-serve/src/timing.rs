use std::time::Instant;

use log::{debug, info};

pub struct Timer {
    name: String,
    tstamp: Option<Instant>,
}

impl Timer {
    /// Create a new timer
    pub fn new(name: &str) -> Self {
        Timer {
            name: name.to_owned(),
            tstamp: None,
        }
    }

    pub fn new_start(name: &str) -> Self {
        let mut t = Timer::new(name);
        t.start();
        t
    }

    /// Start the timer
    pub fn start(&mut self) {
        info!("{}: starting", self.name);

        self.tstamp = Some(Instant::now());
    }

    /// Stop the timer and log the elapsed time
    pub fn stop(&mut self) {
        match self.tstamp.take() {
            None => debug!("{}: not running!", self.name),
            Some(tstamp) => {
                info!(
                    "{} duration: {} msec",
                    self.name,
                    tstamp.elapsed().as_millis()
                );
            }
        }
    }
}
