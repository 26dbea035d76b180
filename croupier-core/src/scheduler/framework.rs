//! Cooperative event scheduler
//!
//! Services register with a priority and a queue capacity. Each call to
//! [`Framework::run_once`] visits the services in priority order (lower value
//! first, ties in registration order) and hands each at most one queued
//! event, then lets every service poll its inputs once. Handlers run to
//! completion; nothing is preempted and nothing is re-entered.
//!
//! Handlers talk back to the scheduler through a [`Context`]. Events they
//! post are staged and only become visible once the current pass ends, so a
//! handler can never cause itself or another service to run early. Capacity
//! is reserved at post time: a staged event that was accepted is never
//! dropped later.

use heapless::{Deque, Vec};

use super::event::{Event, ServiceId, TimerId};
use super::timer::TimerSubsystem;

/// Maximum number of registered services
pub const MAX_SERVICES: usize = 8;

/// Largest queue capacity a service may request
pub const MAX_QUEUE_DEPTH: usize = 16;

/// Scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// Every service slot is taken
    ServiceTableFull,
    /// Requested queue capacity is zero or above `MAX_QUEUE_DEPTH`
    CapacityTooLarge,
    /// No service with that id
    UnknownService,
    /// Target queue (or at least one, for broadcasts) was full
    QueueFull,
    /// Timer id is outside the timer bank
    InvalidTimer,
}

/// A component driven by the scheduler
pub trait Service {
    /// Called once from [`Framework::initialize_all`]
    fn init(&mut self, ctx: &mut Context<'_>);

    /// Handle one event
    fn handle(&mut self, event: Event, ctx: &mut Context<'_>);

    /// Called once at the end of every pass, whether or not an event was
    /// handled. Inputs that must be sampled at a steady rate live here.
    fn poll(&mut self, _ctx: &mut Context<'_>) {}
}

/// Per-service queue bookkeeping
#[derive(Debug)]
struct Mailbox {
    priority: u8,
    capacity: usize,
    queue: Deque<Event, MAX_QUEUE_DEPTH>,
    /// Posted during the current pass; delivered when it ends
    staged: Deque<Event, MAX_QUEUE_DEPTH>,
}

impl Mailbox {
    fn new(priority: u8, capacity: usize) -> Self {
        Self {
            priority,
            capacity,
            queue: Deque::new(),
            staged: Deque::new(),
        }
    }

    fn has_room(&self) -> bool {
        self.queue.len() + self.staged.len() < self.capacity
    }

    fn enqueue(&mut self, event: Event) -> Result<(), SchedulerError> {
        if !self.has_room() {
            return Err(SchedulerError::QueueFull);
        }
        self.queue
            .push_back(event)
            .map_err(|_| SchedulerError::QueueFull)
    }

    fn stage(&mut self, event: Event) -> Result<(), SchedulerError> {
        if !self.has_room() {
            return Err(SchedulerError::QueueFull);
        }
        self.staged
            .push_back(event)
            .map_err(|_| SchedulerError::QueueFull)
    }

    fn flush(&mut self) {
        while let Some(event) = self.staged.pop_front() {
            // Room was reserved when the event was staged
            let _ = self.queue.push_back(event);
        }
    }
}

/// Handle given to a service while it runs
pub struct Context<'c> {
    me: ServiceId,
    mailboxes: &'c mut Vec<Mailbox, MAX_SERVICES>,
    timers: &'c mut TimerSubsystem,
}

impl<'c> Context<'c> {
    /// Id of the service being run
    pub fn me(&self) -> ServiceId {
        self.me
    }

    /// Post to one service; delivered after the current pass
    pub fn post_to(&mut self, id: ServiceId, event: Event) -> Result<(), SchedulerError> {
        self.mailboxes
            .get_mut(id.index())
            .ok_or(SchedulerError::UnknownService)?
            .stage(event)
    }

    /// Post to this service itself
    pub fn post_self(&mut self, event: Event) -> Result<(), SchedulerError> {
        self.post_to(self.me, event)
    }

    /// Post to every service; a full queue does not stop delivery to the rest
    pub fn post_all(&mut self, event: Event) -> Result<(), SchedulerError> {
        let mut result = Ok(());
        for mailbox in self.mailboxes.iter_mut() {
            if let Err(e) = mailbox.stage(event) {
                result = Err(e);
            }
        }
        result
    }

    /// Arm a timer whose expiry will be delivered to this service
    pub fn arm_timer(&mut self, id: TimerId, duration_ms: u32) -> Result<(), SchedulerError> {
        if self.timers.arm(id, duration_ms, self.me) {
            Ok(())
        } else {
            Err(SchedulerError::InvalidTimer)
        }
    }

    pub fn cancel_timer(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }
}

/// The scheduler
///
/// Services are borrowed for the scheduler's lifetime; their state lives
/// wherever the caller put it.
pub struct Framework<'a> {
    services: Vec<&'a mut dyn Service, MAX_SERVICES>,
    mailboxes: Vec<Mailbox, MAX_SERVICES>,
    /// Service indices in dispatch order
    order: Vec<u8, MAX_SERVICES>,
    timers: TimerSubsystem,
}

impl<'a> Default for Framework<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Framework<'a> {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            mailboxes: Vec::new(),
            order: Vec::new(),
            timers: TimerSubsystem::new(),
        }
    }

    /// Register a service
    ///
    /// Lower `priority` values run first. `capacity` is the most events the
    /// service may have waiting at once.
    pub fn register(
        &mut self,
        service: &'a mut dyn Service,
        priority: u8,
        capacity: usize,
    ) -> Result<ServiceId, SchedulerError> {
        if capacity == 0 || capacity > MAX_QUEUE_DEPTH {
            return Err(SchedulerError::CapacityTooLarge);
        }
        if self.services.is_full() {
            return Err(SchedulerError::ServiceTableFull);
        }

        let index = self.services.len() as u8;
        self.services
            .push(service)
            .map_err(|_| SchedulerError::ServiceTableFull)?;
        self.mailboxes
            .push(Mailbox::new(priority, capacity))
            .map_err(|_| SchedulerError::ServiceTableFull)?;

        // Insert after every service of equal or higher priority
        let mailboxes = &self.mailboxes;
        let position = self
            .order
            .iter()
            .position(|&i| mailboxes[i as usize].priority > priority)
            .unwrap_or(self.order.len());
        self.order
            .insert(position, index)
            .map_err(|_| SchedulerError::ServiceTableFull)?;

        Ok(ServiceId(index))
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Run every service's init once, in priority order
    pub fn initialize_all(&mut self) {
        for &index in self.order.iter() {
            let mut ctx = Context {
                me: ServiceId(index),
                mailboxes: &mut self.mailboxes,
                timers: &mut self.timers,
            };
            self.services[index as usize].init(&mut ctx);
        }
        self.flush_staged();
    }

    /// Queue an event for one service
    pub fn post_to(&mut self, id: ServiceId, event: Event) -> Result<(), SchedulerError> {
        self.mailboxes
            .get_mut(id.index())
            .ok_or(SchedulerError::UnknownService)?
            .enqueue(event)
    }

    /// Queue an event for every service
    ///
    /// Delivery continues past full queues; the error reports that at least
    /// one service missed the event.
    pub fn post_all(&mut self, event: Event) -> Result<(), SchedulerError> {
        let mut result = Ok(());
        for mailbox in self.mailboxes.iter_mut() {
            if let Err(e) = mailbox.enqueue(event) {
                result = Err(e);
            }
        }
        result
    }

    /// Dispatch at most one event to each service
    ///
    /// Returns true if any handler ran.
    pub fn run_once(&mut self) -> bool {
        let mut dispatched = false;
        for &index in self.order.iter() {
            let Some(event) = self.mailboxes[index as usize].queue.pop_front() else {
                continue;
            };
            let mut ctx = Context {
                me: ServiceId(index),
                mailboxes: &mut self.mailboxes,
                timers: &mut self.timers,
            };
            self.services[index as usize].handle(event, &mut ctx);
            dispatched = true;
        }
        for &index in self.order.iter() {
            let mut ctx = Context {
                me: ServiceId(index),
                mailboxes: &mut self.mailboxes,
                timers: &mut self.timers,
            };
            self.services[index as usize].poll(&mut ctx);
        }
        self.flush_staged();
        dispatched
    }

    /// Advance timers and deliver each expiry to the owning service
    ///
    /// Returns the number of timeouts dropped because the owner's queue was
    /// full.
    pub fn tick(&mut self, elapsed_ms: u32) -> usize {
        let mut dropped = 0;
        for expiry in self.timers.tick(elapsed_ms) {
            if self.post_to(expiry.owner, Event::Timeout(expiry.timer)).is_err() {
                dropped += 1;
            }
        }
        dropped
    }

    /// Returns true if any service has an event waiting
    pub fn has_pending(&self) -> bool {
        self.mailboxes.iter().any(|m| !m.queue.is_empty())
    }

    /// Events waiting for one service
    pub fn queue_len(&self, id: ServiceId) -> usize {
        self.mailboxes.get(id.index()).map_or(0, |m| m.queue.len())
    }

    pub fn timers(&self) -> &TimerSubsystem {
        &self.timers
    }

    fn flush_staged(&mut self) {
        for mailbox in self.mailboxes.iter_mut() {
            mailbox.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what it handled; optionally forwards or arms a timer
    #[derive(Default)]
    struct Probe {
        seen: std::vec::Vec<Event>,
        forward_to: Option<ServiceId>,
        echo_self: bool,
        init_timer: Option<(TimerId, u32)>,
        init_post: bool,
        log: Option<&'static std::sync::Mutex<std::vec::Vec<u8>>>,
        tag: u8,
        polls: usize,
    }

    impl Service for Probe {
        fn init(&mut self, ctx: &mut Context<'_>) {
            if let Some((id, ms)) = self.init_timer {
                ctx.arm_timer(id, ms).unwrap();
            }
            if self.init_post {
                ctx.post_self(Event::Init).unwrap();
            }
            if let Some(log) = self.log {
                log.lock().unwrap().push(self.tag);
            }
        }

        fn handle(&mut self, event: Event, ctx: &mut Context<'_>) {
            self.seen.push(event);
            if let Some(log) = self.log {
                log.lock().unwrap().push(self.tag);
            }
            if let Some(target) = self.forward_to {
                let _ = ctx.post_to(target, event);
            }
            if self.echo_self {
                let _ = ctx.post_self(event);
            }
        }

        fn poll(&mut self, _ctx: &mut Context<'_>) {
            self.polls += 1;
        }
    }

    #[test]
    fn test_register_limits() {
        let mut rejected = Probe::default();
        let mut oversized = Probe::default();
        let mut extra = Probe::default();
        let mut probes: [Probe; MAX_SERVICES] = Default::default();
        let mut framework = Framework::new();

        assert_eq!(
            framework.register(&mut rejected, 0, 0).unwrap_err(),
            SchedulerError::CapacityTooLarge
        );
        assert_eq!(
            framework
                .register(&mut oversized, 0, MAX_QUEUE_DEPTH + 1)
                .unwrap_err(),
            SchedulerError::CapacityTooLarge
        );
        assert!(framework.is_empty());

        for probe in probes.iter_mut() {
            framework.register(probe, 1, 4).unwrap();
        }
        assert_eq!(
            framework.register(&mut extra, 1, 4).unwrap_err(),
            SchedulerError::ServiceTableFull
        );
        assert_eq!(framework.len(), MAX_SERVICES);
    }

    #[test]
    fn test_fifo_one_event_per_pass() {
        let mut probe = Probe::default();
        {
            let mut framework = Framework::new();
            let id = framework.register(&mut probe, 0, 4).unwrap();
            framework.post_to(id, Event::ObjectNear).unwrap();
            framework.post_to(id, Event::ObjectFar).unwrap();

            assert!(framework.run_once());
            assert_eq!(framework.queue_len(id), 1);
            assert!(framework.run_once());
            assert!(!framework.run_once());
        }
        assert_eq!(probe.seen, [Event::ObjectNear, Event::ObjectFar]);
    }

    #[test]
    fn test_every_pass_polls() {
        let mut busy = Probe::default();
        let mut quiet = Probe::default();
        {
            let mut framework = Framework::new();
            let id = framework.register(&mut busy, 0, 4).unwrap();
            framework.register(&mut quiet, 1, 4).unwrap();
            framework.post_to(id, Event::ObjectNear).unwrap();

            assert!(framework.run_once());
            assert!(!framework.run_once());
            assert!(!framework.run_once());
        }
        assert_eq!(busy.seen.len(), 1);
        assert_eq!(busy.polls, 3);
        assert_eq!(quiet.polls, 3);
    }

    #[test]
    fn test_queue_full_is_reported() {
        let mut probe = Probe::default();
        let mut framework = Framework::new();
        let id = framework.register(&mut probe, 0, 2).unwrap();

        framework.post_to(id, Event::Init).unwrap();
        framework.post_to(id, Event::Init).unwrap();
        assert_eq!(
            framework.post_to(id, Event::Init),
            Err(SchedulerError::QueueFull)
        );
        assert_eq!(framework.queue_len(id), 2);
    }

    #[test]
    fn test_unknown_service() {
        let mut framework = Framework::new();
        assert_eq!(
            framework.post_to(ServiceId(3), Event::Init),
            Err(SchedulerError::UnknownService)
        );
    }

    #[test]
    fn test_post_all_partial_failure() {
        let mut small = Probe::default();
        let mut large = Probe::default();
        {
            let mut framework = Framework::new();
            let small_id = framework.register(&mut small, 0, 1).unwrap();
            let large_id = framework.register(&mut large, 1, 4).unwrap();

            framework.post_to(small_id, Event::Init).unwrap();
            assert_eq!(
                framework.post_all(Event::ObjectNear),
                Err(SchedulerError::QueueFull)
            );
            assert_eq!(framework.queue_len(small_id), 1);
            assert_eq!(framework.queue_len(large_id), 1);

            while framework.run_once() {}
        }
        assert_eq!(small.seen, [Event::Init]);
        assert_eq!(large.seen, [Event::ObjectNear]);
    }

    #[test]
    fn test_priority_then_registration_order() {
        static LOG: std::sync::Mutex<std::vec::Vec<u8>> = std::sync::Mutex::new(std::vec::Vec::new());

        let mut a = Probe {
            log: Some(&LOG),
            tag: b'a',
            ..Default::default()
        };
        let mut b = Probe {
            log: Some(&LOG),
            tag: b'b',
            ..Default::default()
        };
        let mut c = Probe {
            log: Some(&LOG),
            tag: b'c',
            ..Default::default()
        };

        let mut framework = Framework::new();
        framework.register(&mut a, 2, 4).unwrap();
        framework.register(&mut b, 1, 4).unwrap();
        framework.register(&mut c, 2, 4).unwrap();

        framework.initialize_all();
        assert_eq!(LOG.lock().unwrap().as_slice(), b"bac");

        LOG.lock().unwrap().clear();
        framework.post_all(Event::Init).unwrap();
        assert!(framework.run_once());
        assert_eq!(LOG.lock().unwrap().as_slice(), b"bac");
    }

    #[test]
    fn test_posts_from_handlers_wait_for_next_pass() {
        let mut sink = Probe::default();
        let mut source = Probe::default();
        {
            let mut framework = Framework::new();
            // Sink runs after the source in the same pass
            let sink_id = framework.register(&mut sink, 5, 4).unwrap();
            source.forward_to = Some(sink_id);
            let source_id = framework.register(&mut source, 0, 4).unwrap();

            framework.post_to(source_id, Event::ObjectNear).unwrap();
            assert!(framework.run_once());
            assert_eq!(framework.queue_len(sink_id), 1);

            assert!(framework.run_once());
            assert!(!framework.run_once());
        }
        assert_eq!(source.seen, [Event::ObjectNear]);
        assert_eq!(sink.seen, [Event::ObjectNear]);
    }

    #[test]
    fn test_self_post_does_not_reenter() {
        let mut echo = Probe {
            echo_self: true,
            ..Default::default()
        };
        {
            let mut framework = Framework::new();
            let id = framework.register(&mut echo, 0, 2).unwrap();
            framework.post_to(id, Event::ObjectFar).unwrap();

            for _ in 0..3 {
                assert!(framework.run_once());
                assert_eq!(framework.queue_len(id), 1);
            }
        }
        assert_eq!(echo.seen.len(), 3);
    }

    #[test]
    fn test_staged_posts_reserve_capacity() {
        let mut target = Probe::default();
        let mut source = Probe::default();
        {
            let mut framework = Framework::new();
            let target_id = framework.register(&mut target, 5, 1).unwrap();
            source.forward_to = Some(target_id);
            let source_id = framework.register(&mut source, 0, 4).unwrap();

            framework.post_to(source_id, Event::ObjectNear).unwrap();
            framework.post_to(source_id, Event::ObjectFar).unwrap();

            // First pass stages one event for the target, filling it
            framework.run_once();
            assert_eq!(framework.queue_len(target_id), 1);

            // The source runs first, so its second forward finds the target full
            framework.run_once();
            assert_eq!(framework.queue_len(target_id), 0);
            assert!(!framework.run_once());
        }
        assert_eq!(target.seen, [Event::ObjectNear]);
    }

    #[test]
    fn test_init_can_post_startup_event() {
        let mut probe = Probe {
            init_post: true,
            ..Default::default()
        };
        {
            let mut framework = Framework::new();
            framework.register(&mut probe, 0, 2).unwrap();
            framework.initialize_all();
            assert!(framework.has_pending());
            assert!(framework.run_once());
        }
        assert_eq!(probe.seen, [Event::Init]);
    }

    #[test]
    fn test_timeouts_go_to_owner() {
        let mut owner = Probe {
            init_timer: Some((TimerId(1), 70)),
            ..Default::default()
        };
        let mut bystander = Probe::default();
        {
            let mut framework = Framework::new();
            let owner_id = framework.register(&mut owner, 0, 4).unwrap();
            let other_id = framework.register(&mut bystander, 1, 4).unwrap();
            framework.initialize_all();

            assert_eq!(framework.tick(69), 0);
            assert!(!framework.has_pending());
            assert_eq!(framework.tick(1), 0);
            assert_eq!(framework.queue_len(owner_id), 1);
            assert_eq!(framework.queue_len(other_id), 0);
            framework.run_once();
        }
        assert_eq!(owner.seen, [Event::Timeout(TimerId(1))]);
        assert!(bystander.seen.is_empty());
    }

    #[test]
    fn test_dropped_timeouts_are_counted() {
        let mut owner = Probe {
            init_timer: Some((TimerId(2), 10)),
            ..Default::default()
        };
        let mut framework = Framework::new();
        let id = framework.register(&mut owner, 0, 1).unwrap();
        framework.initialize_all();
        framework.post_to(id, Event::Init).unwrap();

        assert_eq!(framework.tick(10), 1);
    }

    #[test]
    fn test_invalid_timer() {
        struct BadTimer(Option<SchedulerError>);
        impl Service for BadTimer {
            fn init(&mut self, ctx: &mut Context<'_>) {
                self.0 = ctx.arm_timer(TimerId(200), 10).err();
            }
            fn handle(&mut self, _event: Event, _ctx: &mut Context<'_>) {}
        }

        let mut service = BadTimer(None);
        {
            let mut framework = Framework::new();
            framework.register(&mut service, 0, 1).unwrap();
            framework.initialize_all();
        }
        assert_eq!(service.0, Some(SchedulerError::InvalidTimer));
    }
}
