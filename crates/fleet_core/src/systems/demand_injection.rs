use bevy_ecs::prelude::{Commands, Entity, Res, ResMut};

use crate::clock::{CurrentTick, SimulationClock};
use crate::demand::DemandGenerator;
use crate::ecs::RideRequest;
use crate::registry::{Backlog, PendingRequests};
use crate::telemetry::{DispatchEvent, EventLog};

/// With probability `CurrentTick::demand_probability`, create one ride request.
pub fn demand_injection_system(
    mut commands: Commands,
    clock: Res<SimulationClock>,
    tick: Res<CurrentTick>,
    mut generator: ResMut<DemandGenerator>,
    mut backlog: ResMut<Backlog>,
    mut pending: ResMut<PendingRequests>,
    mut log: ResMut<EventLog>,
) {
    if !generator.should_generate(tick.demand_probability) {
        return;
    }

    let request = generator.generate(clock.now());
    let entity = commands.spawn(request).id();
    enqueue_request(&request, entity, &clock, &mut backlog, &mut pending, &mut log);
}

/// Register a freshly created request in the backlog and pending queue and log it.
pub(crate) fn enqueue_request(
    request: &RideRequest,
    entity: Entity,
    clock: &SimulationClock,
    backlog: &mut Backlog,
    pending: &mut PendingRequests,
    log: &mut EventLog,
) {
    backlog.push(request.id, entity);
    pending.insert(request.id, entity);
    log.record(
        clock.now(),
        clock.ticks(),
        DispatchEvent::NewDemand {
            request_id: request.id,
            pickup: request.pickup,
            dropoff: request.dropoff,
        },
    );
    tracing::debug!(
        request_id = request.id.0,
        at = clock.now(),
        pickup = %request.pickup,
        dropoff = %request.dropoff,
        "new ride request"
    );
}
