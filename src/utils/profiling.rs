use log::info;
use std::time::Duration;

/// Per-stage timings and counters for the most recent step.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfile {
    pub integration_time: Duration,
    pub constraint_time: Duration,
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub boundary_time: Duration,
    pub event_time: Duration,
    pub lifecycle_time: Duration,
    pub total_step_time: Duration,

    pub body_count: usize,
    pub candidate_pairs: usize,
    pub contact_count: usize,
    pub removed_bodies: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_step_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        let share = |d: Duration| (d.as_micros() as f32 / total_us) * 100.0;
        let ms = |d: Duration| d.as_secs_f32() * 1000.0;

        info!(
            "step: {:.2} ms | bodies {} | pairs {} | contacts {} | removed {}",
            ms(self.total_step_time),
            self.body_count,
            self.candidate_pairs,
            self.contact_count,
            self.removed_bodies
        );
        info!(
            "  integrate {:.2} ms ({:.1}%), constraints {:.2} ms ({:.1}%)",
            ms(self.integration_time),
            share(self.integration_time),
            ms(self.constraint_time),
            share(self.constraint_time)
        );
        info!(
            "  broad {:.2} ms ({:.1}%), narrow {:.2} ms ({:.1}%)",
            ms(self.broad_phase_time),
            share(self.broad_phase_time),
            ms(self.narrow_phase_time),
            share(self.narrow_phase_time)
        );
        info!(
            "  boundary {:.2} ms, events {:.2} ms, lifecycle {:.2} ms",
            ms(self.boundary_time),
            ms(self.event_time),
            ms(self.lifecycle_time)
        );
    }
}
