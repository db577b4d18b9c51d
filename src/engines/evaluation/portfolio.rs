use crate::types::{Direction, ExitReason, Trade};

/// Signal-driven position and equity bookkeeping for the reference
/// simulator. One open position at a time; a sign flip in the signal closes
/// it, end of data closes whatever is left.
pub struct Portfolio {
    initial_capital: f64,
    cash: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
    position_fraction: f64,
    commission: f64,
    last_price: f64,
}

struct Position {
    direction: Direction,
    entry_bar: usize,
    entry_price: f64,
    size: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64, position_fraction: f64, commission: f64) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: vec![initial_capital],
            position_fraction,
            commission,
            last_price: 0.0,
        }
    }

    pub fn process_bar(&mut self, bar: usize, signal: f64, price: f64) {
        if !price.is_finite() || price <= 0.0 {
            // Bad bar: carry equity forward unchanged.
            self.equity_curve.push(self.equity(self.last_price));
            return;
        }
        self.last_price = price;

        match &self.position {
            None if signal != 0.0 => self.open(bar, signal, price),
            Some(pos) => {
                let flip = match pos.direction {
                    Direction::Long => signal < 0.0,
                    Direction::Short => signal > 0.0,
                };
                if flip {
                    self.close(bar, price, ExitReason::Signal);
                }
            }
            None => {}
        }

        self.equity_curve.push(self.equity(price));
    }

    /// Close any open position at the final bar and hand back the run.
    pub fn finish(mut self, last_bar: usize) -> (Vec<f64>, Vec<Trade>) {
        if self.position.is_some() && self.last_price > 0.0 {
            self.close(last_bar, self.last_price, ExitReason::EndOfData);
            if let Some(last) = self.equity_curve.last_mut() {
                *last = self.cash;
            }
        }
        (self.equity_curve, self.trades)
    }

    fn open(&mut self, bar: usize, signal: f64, price: f64) {
        let direction = if signal > 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        let size = (self.cash * self.position_fraction) / price;
        let fees = size * price * self.commission;

        match direction {
            Direction::Long => self.cash -= size * price,
            Direction::Short => self.cash += size * price,
        }
        self.cash -= fees;

        self.position = Some(Position {
            direction,
            entry_bar: bar,
            entry_price: price,
            size,
        });
    }

    fn close(&mut self, bar: usize, price: f64, reason: ExitReason) {
        if let Some(pos) = self.position.take() {
            let gross = match pos.direction {
                Direction::Long => (price - pos.entry_price) * pos.size,
                Direction::Short => (pos.entry_price - price) * pos.size,
            };
            let fees = pos.size * price * self.commission;

            match pos.direction {
                Direction::Long => self.cash += price * pos.size,
                Direction::Short => self.cash -= price * pos.size,
            }
            self.cash -= fees;

            self.trades.push(Trade {
                entry_bar: pos.entry_bar,
                exit_bar: bar,
                entry_price: pos.entry_price,
                exit_price: price,
                direction: pos.direction,
                size: pos.size,
                pnl: gross - fees,
                fees,
                exit_reason: reason,
            });
        }
    }

    fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Some(pos) => {
                let unrealized = match pos.direction {
                    Direction::Long => (price - pos.entry_price) * pos.size,
                    Direction::Short => (pos.entry_price - price) * pos.size,
                };
                let held = match pos.direction {
                    Direction::Long => pos.entry_price * pos.size,
                    Direction::Short => -pos.entry_price * pos.size,
                };
                self.cash + held + unrealized
            }
            None => self.cash,
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_round_trip_books_profit() {
        let mut portfolio = Portfolio::new(10_000.0, 0.1, 0.0);
        portfolio.process_bar(0, 1.0, 100.0);
        portfolio.process_bar(1, 1.0, 105.0);
        portfolio.process_bar(2, -1.0, 110.0);
        let (equity, trades) = portfolio.finish(3);

        assert_eq!(trades.len(), 1);
        assert!(trades[0].pnl > 0.0);
        assert!(equity.last().copied().unwrap() > 10_000.0);
    }

    #[test]
    fn test_open_position_closed_at_end_of_data() {
        let mut portfolio = Portfolio::new(10_000.0, 0.1, 0.0);
        portfolio.process_bar(0, 1.0, 100.0);
        portfolio.process_bar(1, 1.0, 101.0);
        let (_, trades) = portfolio.finish(1);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::EndOfData);
    }

    #[test]
    fn test_no_signal_means_no_trades() {
        let mut portfolio = Portfolio::new(10_000.0, 0.1, 0.0);
        for bar in 0..5 {
            portfolio.process_bar(bar, 0.0, 100.0 + bar as f64);
        }
        let (equity, trades) = portfolio.finish(4);

        assert!(trades.is_empty());
        assert!(equity.iter().all(|&e| (e - 10_000.0).abs() < 1e-9));
    }
}
