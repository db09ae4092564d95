//! Trading strategies as ordered chains of steps.
//!
//! A chain is evaluated front to back. Each step receives the orders produced
//! by the steps before it and passes them on, transforms them or replaces
//! them. The first step of a chain sees empty order lists.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::chart::{Amount, Bar};
use crate::domain::instrument::{InstrumentRef, Instruments};
use crate::domain::position::{CloseReason, Position};

#[derive(Debug, Clone)]
pub struct PurchaseOrder {
    pub instrument: InstrumentRef,
    pub amount: Amount,
}

#[derive(Debug, Clone)]
pub struct CloseOrder {
    pub position: Position,
    pub confidence: f64,
    pub reason: CloseReason,
}

pub type PurchaseOrders = Vec<PurchaseOrder>;
pub type CloseOrders = Vec<CloseOrder>;

/// Snapshot of the account and market handed to a strategy at one bar.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub bar: Bar,
    /// Account value at `bar`.
    pub value: Amount,
    /// Cash available for purchases.
    pub amount: Amount,
    /// Candidate purchases, one per instrument priced at `bar`.
    pub purchase_orders: PurchaseOrders,
    pub positions: Vec<Position>,
    /// Candidate closes, one per open position.
    pub close_orders: CloseOrders,
}

/// Decides which positions to open and which to close.
///
/// Implementations must not touch account state; effects flow through the
/// returned orders only.
pub trait Strategy {
    fn open(&mut self, context: &StrategyContext) -> PurchaseOrders;
    fn close(&mut self, context: &StrategyContext) -> CloseOrders;
    fn name(&self) -> String;
}

/// Fixed inputs for the base step. Fields left `None` defer to the
/// orders of earlier steps.
#[derive(Debug, Clone, Default)]
pub struct StrategyConfig {
    pub instruments: Option<Instruments>,
    pub positions: Option<Vec<Position>>,
    /// Total amount spread evenly over `instruments`. Defaults to the
    /// context's available cash.
    pub amount: Option<Amount>,
}

impl StrategyConfig {
    pub fn new() -> Self {
        StrategyConfig::default()
    }

    pub fn instruments(mut self, instruments: Instruments) -> Self {
        self.instruments = Some(instruments);
        self
    }

    pub fn positions(mut self, positions: Vec<Position>) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Names of the steps that can be listed in a configured chain.
pub const STEP_NAMES: &[&str] = &[
    "candidates",
    "null",
    "exit",
    "limit",
    "max",
    "random",
    "active",
    "expired",
];

#[derive(Debug, Clone)]
pub enum Step {
    /// Equal-amount purchases of configured instruments and full closes of
    /// configured positions. Passes orders through when unconfigured.
    Base(StrategyConfig),
    /// Replace orders with the context's own candidates.
    Candidates,
    /// Nothing to buy or sell.
    Null,
    /// Buy nothing.
    Exit,
    /// Keep the first n orders on each side.
    Limit(usize),
    /// Cap the amount of every purchase.
    Max(Amount),
    /// With even odds, keep one order picked at random.
    Random(StdRng),
    /// Keep purchases of instruments priced at the context bar.
    Active,
    /// Keep closes of positions whose instrument is no longer priced.
    Expired,
}

fn pick<T, R: Rng>(rng: &mut R, mut items: Vec<T>) -> Vec<T> {
    if items.is_empty() || !rng.gen_bool(0.5) {
        return Vec::new();
    }
    let index = rng.gen_range(0..items.len());
    vec![items.swap_remove(index)]
}

impl Step {
    pub fn random(seed: u64) -> Self {
        Step::Random(StdRng::seed_from_u64(seed))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Base(_) => "base",
            Step::Candidates => "candidates",
            Step::Null => "null",
            Step::Exit => "exit",
            Step::Limit(_) => "limit",
            Step::Max(_) => "max",
            Step::Random(_) => "random",
            Step::Active => "active",
            Step::Expired => "expired",
        }
    }

    pub fn open(&mut self, context: &StrategyContext, orders: PurchaseOrders) -> PurchaseOrders {
        match self {
            Step::Base(config) => match &config.instruments {
                Some(instruments) if !instruments.is_empty() => {
                    let total = config.amount.unwrap_or(context.amount);
                    let amount = total / instruments.len() as f64;
                    instruments
                        .iter()
                        .map(|instrument| PurchaseOrder {
                            instrument: InstrumentRef::clone(instrument),
                            amount,
                        })
                        .collect()
                }
                Some(_) => Vec::new(),
                None => orders,
            },
            Step::Candidates => context.purchase_orders.clone(),
            Step::Null | Step::Exit => Vec::new(),
            Step::Limit(count) => orders.into_iter().take(*count).collect(),
            Step::Max(threshold) => orders
                .into_iter()
                .map(|order| PurchaseOrder {
                    amount: order.amount.min(*threshold),
                    ..order
                })
                .collect(),
            Step::Random(rng) => pick(rng, orders),
            Step::Active => orders
                .into_iter()
                .filter(|order| order.instrument.has(context.bar))
                .collect(),
            Step::Expired => orders,
        }
    }

    pub fn close(&mut self, context: &StrategyContext, orders: CloseOrders) -> CloseOrders {
        match self {
            Step::Base(config) => match &config.positions {
                Some(positions) => positions
                    .iter()
                    .map(|position| CloseOrder {
                        position: position.clone(),
                        confidence: 1.0,
                        reason: CloseReason::Close,
                    })
                    .collect(),
                None => orders,
            },
            Step::Candidates => context.close_orders.clone(),
            Step::Null => Vec::new(),
            Step::Limit(count) => orders.into_iter().take(*count).collect(),
            Step::Random(rng) => pick(rng, orders),
            Step::Expired => orders
                .into_iter()
                .filter(|order| !order.position.instrument.has(context.bar))
                .collect(),
            Step::Exit | Step::Max(_) | Step::Active => orders,
        }
    }
}

/// Ordered list of steps forming one strategy.
#[derive(Debug, Clone)]
pub struct Chain {
    steps: Vec<Step>,
}

impl Default for Chain {
    fn default() -> Self {
        Chain::with_config(StrategyConfig::default())
    }
}

impl Chain {
    pub fn new() -> Self {
        Chain::default()
    }

    pub fn with_config(config: StrategyConfig) -> Self {
        Chain {
            steps: vec![Step::Base(config)],
        }
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Chain { steps }
    }

    /// Root step of the chain.
    pub fn first(&self) -> Option<&Step> {
        self.steps.first()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Place `other` after this chain.
    pub fn append(mut self, other: Chain) -> Chain {
        self.steps.extend(other.steps);
        self
    }

    /// Place `other` before this chain.
    pub fn prepend(self, other: Chain) -> Chain {
        other.append(self)
    }

    pub fn then(mut self, step: Step) -> Chain {
        self.steps.push(step);
        self
    }

    pub fn candidates(self) -> Chain {
        self.then(Step::Candidates)
    }

    pub fn null(self) -> Chain {
        self.then(Step::Null)
    }

    pub fn exit(self) -> Chain {
        self.then(Step::Exit)
    }

    pub fn limit(self, count: usize) -> Chain {
        self.then(Step::Limit(count))
    }

    pub fn max(self, threshold: Amount) -> Chain {
        self.then(Step::Max(threshold))
    }

    pub fn random(self, seed: u64) -> Chain {
        self.then(Step::random(seed))
    }

    pub fn active(self) -> Chain {
        self.then(Step::Active)
    }

    pub fn expired(self) -> Chain {
        self.then(Step::Expired)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::name).collect()
    }
}

impl Strategy for Chain {
    fn open(&mut self, context: &StrategyContext) -> PurchaseOrders {
        self.steps
            .iter_mut()
            .fold(Vec::new(), |orders, step| step.open(context, orders))
    }

    fn close(&mut self, context: &StrategyContext) -> CloseOrders {
        self.steps
            .iter_mut()
            .fold(Vec::new(), |orders, step| step.close(context, orders))
    }

    fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(" > "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::Instrument;
    use crate::domain::position::PositionId;
    use std::rc::Rc;

    const NEWEST: Bar = 0;

    fn instruments() -> Instruments {
        vec![
            // bars 3..1
            Rc::new(Instrument::from_prices(vec![1.0, 2.0, 3.0], 1, "AAA")),
            // bars 2..0
            Rc::new(Instrument::from_prices(vec![4.0, 5.0, 6.0], NEWEST, "BBB")),
        ]
    }

    fn positions(instruments: &Instruments) -> Vec<Position> {
        instruments
            .iter()
            .enumerate()
            .map(|(i, instrument)| Position {
                id: PositionId(i as u64 + 1),
                instrument: Rc::clone(instrument),
                amount: 1000.0,
                price: 2.0,
                net: 1000.0,
                units: 500.0,
                start: 2,
            })
            .collect()
    }

    fn context(bar: Bar) -> StrategyContext {
        let instruments = instruments();
        let positions = positions(&instruments);
        StrategyContext {
            bar,
            value: 3000.0,
            amount: 1000.0,
            purchase_orders: instruments
                .iter()
                .map(|i| PurchaseOrder {
                    instrument: Rc::clone(i),
                    amount: 500.0,
                })
                .collect(),
            close_orders: positions
                .iter()
                .map(|p| CloseOrder {
                    position: p.clone(),
                    confidence: 1.0,
                    reason: CloseReason::Close,
                })
                .collect(),
            positions,
        }
    }

    fn configured() -> Chain {
        let instruments = instruments();
        let positions = positions(&instruments);
        Chain::with_config(StrategyConfig::new().instruments(instruments).positions(positions))
    }

    fn symbols(orders: &PurchaseOrders) -> Vec<String> {
        orders.iter().map(|o| o.instrument.symbol.clone()).collect()
    }

    #[test]
    fn default_chain_is_empty() {
        let mut chain = Chain::new();
        let ctx = context(2);
        assert!(chain.open(&ctx).is_empty());
        assert!(chain.close(&ctx).is_empty());
        assert_eq!(chain.names(), vec!["base"]);
    }

    #[test]
    fn configured_base_splits_amount() {
        let mut chain = configured();
        let orders = chain.open(&context(2));
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| (o.amount - 500.0).abs() < f64::EPSILON));
        let closes = chain.close(&context(2));
        assert_eq!(closes.len(), 2);
        assert!(closes.iter().all(|c| c.reason == CloseReason::Close));
    }

    #[test]
    fn configured_amount_overrides_context() {
        let mut chain = Chain::with_config(StrategyConfig::new().instruments(instruments()).amount(80.0));
        let orders = chain.open(&context(2));
        assert!(orders.iter().all(|o| (o.amount - 40.0).abs() < f64::EPSILON));
    }

    #[test]
    fn prepend_and_append_order_steps() {
        let a = Chain::new().exit();
        let b = Chain::from_steps(vec![Step::Candidates]);
        assert_eq!(a.clone().append(b.clone()).names(), vec!["base", "exit", "candidates"]);
        assert_eq!(a.prepend(b).names(), vec!["candidates", "base", "exit"]);
    }

    #[test]
    fn first_is_root_step() {
        let chain = Chain::from_steps(vec![Step::Null]).append(Chain::new().limit(1));
        assert_eq!(chain.first().map(Step::name), Some("null"));
    }

    #[test]
    fn exit_sells_all_buys_nothing() {
        let mut chain = configured().exit();
        assert!(chain.open(&context(2)).is_empty());
        assert_eq!(chain.close(&context(2)).len(), 2);
    }

    #[test]
    fn null_empties_both_sides() {
        let mut chain = configured().null();
        assert!(chain.open(&context(2)).is_empty());
        assert!(chain.close(&context(2)).is_empty());
    }

    #[test]
    fn limit_truncates() {
        for (count, expected) in [(0, 0), (1, 1), (2, 2), (3, 2)] {
            let mut chain = configured().limit(count);
            assert_eq!(chain.open(&context(2)).len(), expected);
            assert_eq!(chain.close(&context(2)).len(), expected);
        }
    }

    #[test]
    fn max_caps_amount() {
        let mut chain = configured().max(120.0);
        let orders = chain.open(&context(2));
        assert!(orders.iter().all(|o| (o.amount - 120.0).abs() < f64::EPSILON));
        let mut loose = configured().max(10_000.0);
        let orders = loose.open(&context(2));
        assert!(orders.iter().all(|o| (o.amount - 500.0).abs() < f64::EPSILON));
    }

    #[test]
    fn candidates_come_from_context() {
        let mut chain = Chain::new().candidates();
        let ctx = context(2);
        assert_eq!(symbols(&chain.open(&ctx)), vec!["AAA", "BBB"]);
        assert_eq!(chain.close(&ctx).len(), 2);
    }

    #[test]
    fn active_keeps_priced_instruments() {
        let mut chain = Chain::new().candidates().active();
        assert_eq!(symbols(&chain.open(&context(3))), vec!["AAA"]);
        assert_eq!(symbols(&chain.open(&context(NEWEST))), vec!["BBB"]);
        assert_eq!(chain.close(&context(NEWEST)).len(), 2);
    }

    #[test]
    fn expired_keeps_unpriced_positions() {
        let mut chain = Chain::new().candidates().expired();
        let closes = chain.close(&context(NEWEST));
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].position.instrument.symbol, "AAA");
        assert_eq!(chain.open(&context(NEWEST)).len(), 2);
    }

    #[test]
    fn random_picks_at_most_one() {
        let mut chain = configured().random(42);
        let ctx = context(2);
        let mut seen_buy = [false; 2];
        let mut seen_sell = [false; 2];
        for _ in 0..200 {
            let buys = chain.open(&ctx);
            assert!(buys.len() <= 1);
            seen_buy[buys.len()] = true;
            let sells = chain.close(&ctx);
            assert!(sells.len() <= 1);
            seen_sell[sells.len()] = true;
            for sell in &sells {
                assert!(ctx.positions.contains(&sell.position));
            }
        }
        assert_eq!(seen_buy, [true, true]);
        assert_eq!(seen_sell, [true, true]);
    }

    #[test]
    fn random_is_reproducible() {
        let ctx = context(2);
        let run = |seed| {
            let mut chain = configured().random(seed);
            (0..20).map(|_| symbols(&chain.open(&ctx))).collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn display_joins_names() {
        let chain = Chain::new().candidates().active().random(1).max(10.0).limit(1);
        assert_eq!(chain.name(), "base > candidates > active > random > max > limit");
    }
}
