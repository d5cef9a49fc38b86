use crate::app::scenarios::ACTOR_SERIALIZATION;
use crate::core::actor::{Actor, Context, Handler, Message};
use crate::core::runtime::Runtime;
use crate::core::task::spawn_detached;
use crate::domain::model::ScenarioOutcome;
use crate::domain::ports::Scenario;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counter whose update is split by an await point.
#[derive(Debug)]
pub struct CounterActor {
    value: u64,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl CounterActor {
    pub fn new(in_flight: Arc<AtomicUsize>, max_in_flight: Arc<AtomicUsize>) -> Self {
        Self {
            value: 0,
            in_flight,
            max_in_flight,
        }
    }
}

impl Actor for CounterActor {
    fn name(&self) -> &str {
        "CounterActor"
    }
}

pub struct Increment;

impl Message for Increment {
    type Reply = u64;
}

pub struct Current;

impl Message for Current {
    type Reply = u64;
}

#[async_trait]
impl Handler<Increment> for CounterActor {
    async fn handle(&mut self, _msg: Increment, _cx: &mut Context<Self>) -> u64 {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let read = self.value;
        tokio::task::yield_now().await;
        self.value = read + 1;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.value
    }
}

#[async_trait]
impl Handler<Current> for CounterActor {
    async fn handle(&mut self, _msg: Current, _cx: &mut Context<Self>) -> u64 {
        self.value
    }
}

pub struct ActorSerializationScenario {
    calls: usize,
}

impl ActorSerializationScenario {
    pub fn new(calls: usize) -> Self {
        Self {
            calls: calls.max(1),
        }
    }
}

#[async_trait(?Send)]
impl Scenario for ActorSerializationScenario {
    fn name(&self) -> &str {
        ACTOR_SERIALIZATION
    }

    fn description(&self) -> &str {
        "concurrent calls into one actor never interleave"
    }

    async fn run(&self, runtime: &Runtime) -> Result<ScenarioOutcome> {
        let mut outcome = ScenarioOutcome::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let counter = runtime.spawn_actor(CounterActor::new(
            Arc::clone(&in_flight),
            Arc::clone(&max_in_flight),
        ));

        let handles: Vec<_> = (0..self.calls)
            .map(|_| {
                let counter = counter.clone();
                spawn_detached(move |_| async move { counter.ask(Increment).await })
            })
            .collect();
        for handle in handles {
            handle.join().await??;
        }

        let value = counter.ask(Current).await?;
        outcome.check(
            value == self.calls as u64,
            format!("{} concurrent increments produced {}", self.calls, value),
        );
        outcome.check(
            max_in_flight.load(Ordering::SeqCst) == 1,
            format!(
                "at most one handler ran at a time (observed {})",
                max_in_flight.load(Ordering::SeqCst)
            ),
        );

        // 對照組：同樣的讀取-讓出-寫入，但沒有 actor 保護
        let unguarded = Arc::new(AtomicU64::new(0));
        let handles: Vec<_> = (0..self.calls)
            .map(|_| {
                let unguarded = Arc::clone(&unguarded);
                spawn_detached(move |_| async move {
                    let read = unguarded.load(Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    unguarded.store(read + 1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().await?;
        }
        outcome.observe(format!(
            "without the actor the same update kept {} of {} increments",
            unguarded.load(Ordering::SeqCst),
            self.calls
        ));

        Ok(outcome)
    }
}
