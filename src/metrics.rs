use std::collections::VecDeque;

/// Moving average over a fixed window, pre-filled with zeros.
///
/// Early averages are pulled towards zero until the window has seen
/// `window` real values; the stopping criterion reads the average over
/// the full window either way.
pub struct MovingAverager {
    buffer: VecDeque<f32>,
}

impl MovingAverager {
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "moving average window must be positive");
        MovingAverager {
            buffer: std::iter::repeat(0.0).take(window).collect(),
        }
    }

    pub fn append(&mut self, value: f32) {
        self.buffer.pop_front();
        self.buffer.push_back(value);
    }

    pub fn average(&self) -> f32 {
        self.buffer.iter().sum::<f32>() / self.buffer.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_full_window() {
        let mut averager = MovingAverager::new(4);
        assert_eq!(averager.average(), 0.0);

        averager.append(8.0);
        assert_eq!(averager.average(), 2.0);

        averager.append(4.0);
        averager.append(4.0);
        averager.append(4.0);
        assert_eq!(averager.average(), 5.0);
    }

    #[test]
    fn test_old_values_fall_out() {
        let mut averager = MovingAverager::new(2);
        averager.append(10.0);
        averager.append(20.0);
        averager.append(30.0);
        assert_eq!(averager.average(), 25.0);
    }
}
