use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Cadence fixe de l'hôte : un tick toutes les `1 / fps` secondes.
///
/// Un retard n'est jamais rattrapé : après un tick manqué, l'échéance
/// suivante repart de l'instant présent.
///
/// # Example
/// ```
/// use ht_render::ticker::FrameTicker;
/// use std::time::{Duration, Instant};
/// let start = Instant::now();
/// let mut ticker = FrameTicker::starting_at(50, start);
/// assert!(ticker.poll(start));
/// assert!(!ticker.poll(start + Duration::from_millis(5)));
/// assert!(ticker.poll(start + Duration::from_millis(20)));
/// ```
pub struct FrameTicker {
    period: Duration,
    next: Instant,
}

impl FrameTicker {
    /// Ticker dont le premier tick est immédiat.
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self::starting_at(fps, Instant::now())
    }

    /// Ticker dont le premier tick tombe à `start`.
    #[must_use]
    pub fn starting_at(fps: u32, start: Instant) -> Self {
        Self {
            period: period_for(fps),
            next: start,
        }
    }

    /// Change la cadence ; l'échéance en cours est conservée.
    pub fn set_fps(&mut self, fps: u32) {
        self.period = period_for(fps);
    }

    /// Période courante.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Temps restant avant le prochain tick (zéro s'il est dû).
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// `true` si un tick est dû à `now` ; avance alors l'échéance.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }
}

fn period_for(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
}

/// Passes par seconde sur une fenêtre glissante d'une seconde.
///
/// # Example
/// ```
/// use ht_render::ticker::FpsCounter;
/// use std::time::{Duration, Instant};
/// let t0 = Instant::now();
/// let mut fps = FpsCounter::new();
/// for i in 0..11 {
///     fps.record(t0 + Duration::from_millis(i * 100));
/// }
/// assert!((fps.fps() - 10.0).abs() < 1e-6);
/// ```
#[derive(Default)]
pub struct FpsCounter {
    stamps: VecDeque<Instant>,
    fps: f64,
    /// Dernier intervalle entre deux passes, en ms.
    pub frame_time_ms: f64,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une passe terminée à `now`.
    pub fn record(&mut self, now: Instant) {
        if let Some(&last) = self.stamps.back() {
            self.frame_time_ms = now.saturating_duration_since(last).as_secs_f64() * 1000.0;
        }
        self.stamps.push_back(now);
        while let Some(&first) = self.stamps.front() {
            if now.saturating_duration_since(first) > Self::WINDOW {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
        self.fps = match (self.stamps.front(), self.stamps.len()) {
            (Some(&first), n) if n >= 2 => {
                let secs = now.saturating_duration_since(first).as_secs_f64();
                if secs > 0.0 { (n - 1) as f64 / secs } else { self.fps }
            }
            _ => 0.0,
        };
    }

    /// Moyenne courante.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}
