//! Serialized actors.
//!
//! Each actor owns its state inside its own domain and processes one mailbox
//! envelope at a time, awaits included. Two calls into the same actor never
//! interleave; they queue and run one after another.
//!
//! Messages are moved into the mailbox, so they only need to be `Send`. A
//! value the sender wants to keep using has to be shared through something
//! Sendable such as `Arc<T>`:
//!
//! ```compile_fail
//! use isolation_lab::core::actor::Message;
//! use std::{cell::Cell, sync::Arc};
//!
//! struct Bump(Arc<Cell<u32>>);
//! impl Message for Bump {
//!     type Reply = ();
//! }
//! ```

use crate::core::domain::{sealed, ActorId, DomainId, ExecutionDomain};
use crate::core::runtime::Runtime;
use crate::utils::error::{LabError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

tokio::task_local! {
    static EXECUTING: DomainId;
}

#[async_trait]
pub trait Actor: Send + Sized + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn started(&mut self, _cx: &mut Context<Self>) {}

    async fn stopped(&mut self) {}
}

pub trait Message: Send + 'static {
    type Reply: Send + 'static;
}

#[async_trait]
pub trait Handler<M: Message>: Actor {
    async fn handle(&mut self, msg: M, cx: &mut Context<Self>) -> M::Reply;
}

#[async_trait]
pub(crate) trait Envelope<A: Actor>: Send {
    async fn deliver(self: Box<Self>, actor: &mut A, cx: &mut Context<A>);
}

struct Request<M: Message> {
    msg: M,
    reply: Option<oneshot::Sender<M::Reply>>,
}

#[async_trait]
impl<A, M> Envelope<A> for Request<M>
where
    A: Handler<M>,
    M: Message,
{
    async fn deliver(self: Box<Self>, actor: &mut A, cx: &mut Context<A>) {
        let Request { msg, reply } = *self;
        let out = actor.handle(msg, cx).await;
        cx.processed.fetch_add(1, Ordering::Release);
        if let Some(reply) = reply {
            // 呼叫端可能已經放棄等待
            let _ = reply.send(out);
        }
    }
}

struct Job<F, R> {
    f: F,
    reply: oneshot::Sender<R>,
}

#[async_trait]
impl<A, F, R> Envelope<A> for Job<F, R>
where
    A: Actor,
    F: FnOnce(&mut A, &mut Context<A>) -> R + Send + 'static,
    R: Send + 'static,
{
    async fn deliver(self: Box<Self>, actor: &mut A, cx: &mut Context<A>) {
        let Job { f, reply } = *self;
        let out = f(actor, cx);
        cx.processed.fetch_add(1, Ordering::Release);
        let _ = reply.send(out);
    }
}

/// Handle to an actor. Cloning it is cheap and it is Sendable.
pub struct ActorRef<A: Actor> {
    id: ActorId,
    name: Arc<str>,
    tx: mpsc::Sender<Box<dyn Envelope<A>>>,
    processed: Arc<AtomicU64>,
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            tx: self.tx.clone(),
            processed: Arc::clone(&self.processed),
        }
    }
}

impl<A: Actor> std::fmt::Debug for ActorRef<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<A: Actor> ActorRef<A> {
    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn domain(&self) -> DomainId {
        DomainId::Actor(self.id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Envelopes fully processed so far.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    fn closed(&self) -> LabError {
        LabError::MailboxClosed {
            actor: format!("{} ({})", self.name, self.id),
        }
    }

    fn guard_reentry(&self) -> Result<()> {
        match EXECUTING.try_with(|current| *current) {
            Ok(current) if current == self.domain() => Err(LabError::ReentrantCall {
                domain: current,
            }),
            _ => Ok(()),
        }
    }

    async fn enqueue(&self, envelope: Box<dyn Envelope<A>>) -> Result<()> {
        self.tx.send(envelope).await.map_err(|_| self.closed())
    }

    /// Sends `msg` and suspends until the actor has handled it.
    pub async fn ask<M>(&self, msg: M) -> Result<M::Reply>
    where
        A: Handler<M>,
        M: Message,
    {
        self.guard_reentry()?;
        let (tx, rx) = oneshot::channel();
        self.enqueue(Box::new(Request {
            msg,
            reply: Some(tx),
        }))
        .await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Queues `msg` without waiting for it to be handled.
    ///
    /// From inside the actor's own handler the mailbox cannot drain while the
    /// handler waits, so a full mailbox fails with `ReentrantCall` instead.
    pub async fn tell<M>(&self, msg: M) -> Result<()>
    where
        A: Handler<M>,
        M: Message,
    {
        let envelope: Box<dyn Envelope<A>> = Box::new(Request { msg, reply: None });
        if self.guard_reentry().is_ok() {
            return self.enqueue(envelope).await;
        }
        self.tx.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LabError::ReentrantCall {
                domain: self.domain(),
            },
            mpsc::error::TrySendError::Closed(_) => self.closed(),
        })
    }

    /// Runs `f` inside the actor's domain with exclusive access to its state.
    pub async fn run<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut A, &mut Context<A>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.guard_reentry()?;
        let (tx, rx) = oneshot::channel();
        self.enqueue(Box::new(Job { f, reply: tx })).await?;
        rx.await.map_err(|_| self.closed())
    }
}

/// The actor's view of its own domain, lent to one handler at a time.
pub struct Context<A: Actor> {
    pub(crate) id: ActorId,
    pub(crate) name: Arc<str>,
    myself: mpsc::WeakSender<Box<dyn Envelope<A>>>,
    processed: Arc<AtomicU64>,
    runtime: Runtime,
    stopping: bool,
}

impl<A: Actor> Context<A> {
    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// A handle to this actor, if anyone outside still holds one.
    pub fn myself(&self) -> Option<ActorRef<A>> {
        self.myself.upgrade().map(|tx| ActorRef {
            id: self.id,
            name: Arc::clone(&self.name),
            tx,
            processed: Arc::clone(&self.processed),
        })
    }

    /// Stops the actor after the current envelope.
    pub fn stop(&mut self) {
        self.stopping = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }
}

impl<A: Actor> sealed::Sealed for Context<A> {}

impl<A: Actor> ExecutionDomain for Context<A> {
    fn domain_id(&self) -> DomainId {
        DomainId::Actor(self.id)
    }
}

pub(crate) fn start<A: Actor>(mut actor: A, id: ActorId, runtime: Runtime) -> ActorRef<A> {
    let capacity = runtime.config().mailbox_capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<Box<dyn Envelope<A>>>(capacity);
    let name: Arc<str> = Arc::from(actor.name());
    let processed = Arc::new(AtomicU64::new(0));

    let mut cx = Context {
        id,
        name: Arc::clone(&name),
        myself: tx.downgrade(),
        processed: Arc::clone(&processed),
        runtime,
        stopping: false,
    };
    let actor_ref = ActorRef {
        id,
        name,
        tx,
        processed,
    };

    tokio::spawn(async move {
        let domain = DomainId::Actor(id);
        tracing::debug!("🎬 {} ({}) started", cx.name, id);
        EXECUTING.scope(domain, actor.started(&mut cx)).await;

        while !cx.stopping {
            let Some(envelope) = rx.recv().await else {
                break;
            };
            EXECUTING
                .scope(domain, envelope.deliver(&mut actor, &mut cx))
                .await;
        }

        rx.close();
        actor.stopped().await;
        tracing::debug!(
            "🛑 {} ({}) stopped after {} envelope(s)",
            cx.name,
            id,
            cx.processed.load(Ordering::Acquire)
        );
    });

    actor_ref
}
