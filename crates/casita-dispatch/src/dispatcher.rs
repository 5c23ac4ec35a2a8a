//! Serialized command execution under zone locks

use crate::binding::{ActionPolicy, ButtonBinding};
use casita_core::{ButtonId, CommandError, Device, Gesture, SharedDeviceCommands};
use casita_gesture::{ListenerError, ListenerRegistry};
use casita_zones::ZoneLocks;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, trace};

/// Pause between the belief-state correction and the real command, so the
/// bridge has committed the corrected state before transmitting
const BELIEF_CORRECTION_PAUSE: Duration = Duration::from_secs(1);

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that abort one dispatch invocation
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No bridge device carries the configured name
    #[error("device '{name}' not found on bridge")]
    DeviceNotFound { name: String },

    /// A device command failed
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Executes button bindings against the hardware bridge
///
/// One dispatch invocation holds its zone's lock from before device
/// resolution until after the settle delay; failures skip the settle but
/// still release the lock on the way out.
pub struct Dispatcher {
    commands: SharedDeviceCommands,
    zones: Arc<ZoneLocks>,
    settle_delay: Duration,
}

impl Dispatcher {
    pub fn new(commands: SharedDeviceCommands, zones: Arc<ZoneLocks>, settle_delay: Duration) -> Self {
        Self {
            commands,
            zones,
            settle_delay,
        }
    }

    /// Run one binding for one classified gesture
    ///
    /// Blocks until the zone lock is free; a second gesture targeting a
    /// busy zone waits out the first invocation's settle delay. Never
    /// retries: failed invocations surface to the emission boundary.
    pub async fn dispatch(
        &self,
        binding: &ButtonBinding,
        button: &ButtonId,
        gesture: Gesture,
    ) -> DispatchResult<()> {
        trace!(zone = %binding.zone, button = %button, "waiting for zone lock");
        let _guard = self.zones.acquire(&binding.zone).await;

        let outcome = self.execute(binding, button, gesture).await;
        if let Ok(true) = outcome {
            // Hold the zone through the settle delay so a rapid repeat
            // gesture cannot reach the receiver before it is ready.
            sleep(self.settle_delay).await;
        }
        outcome.map(|_| ())
    }

    /// Find a bridge device by its human-readable name
    ///
    /// The bridge has no lookup-by-name endpoint: list the IDs, fetch
    /// each device, compare. Dispatch traffic is a button press every few
    /// seconds at worst, so the extra round trips are irrelevant.
    pub async fn resolve_device(&self, name: &str) -> DispatchResult<Device> {
        for device_id in self.commands.list_devices().await? {
            let device = self.commands.get_device(&device_id).await?;
            if device.name.as_deref() == Some(name) {
                debug!(id = %device.device_id, name = %name, "resolved device");
                return Ok(device);
            }
        }
        Err(DispatchError::DeviceNotFound {
            name: name.to_string(),
        })
    }

    /// Issue the policy's commands; Ok(false) means the gesture was a
    /// no-op for this policy and nothing was sent
    async fn execute(
        &self,
        binding: &ButtonBinding,
        button: &ButtonId,
        gesture: Gesture,
    ) -> DispatchResult<bool> {
        if !binding.policy.reacts_to(gesture) {
            debug!(
                button = %button,
                policy = %binding.policy,
                gesture = %gesture,
                "gesture is a no-op for this policy"
            );
            return Ok(false);
        }

        let device = self.resolve_device(&binding.device).await?;
        let id = &device.device_id;
        let commands = self.commands.as_ref();

        match (binding.policy, gesture) {
            (ActionPolicy::LightToggle, _) => {
                info!(button = %button, device = %binding.device, "toggling light");
                commands.toggle_light(id).await?;
            }
            (ActionPolicy::LightOn, Gesture::DoubleClick) => {
                info!(button = %button, device = %binding.device, "forcing light on");
                commands.set_light_belief_state(id, false).await?;
                sleep(BELIEF_CORRECTION_PAUSE).await;
                commands.light_on(id).await?;
            }
            (ActionPolicy::LightOn, _) => {
                info!(button = %button, device = %binding.device, "turning light on");
                commands.light_on(id).await?;
            }
            (ActionPolicy::LightOff, Gesture::DoubleClick) => {
                info!(button = %button, device = %binding.device, "forcing light off");
                commands.set_light_belief_state(id, true).await?;
                sleep(BELIEF_CORRECTION_PAUSE).await;
                commands.light_off(id).await?;
            }
            (ActionPolicy::LightOff, _) => {
                info!(button = %button, device = %binding.device, "turning light off");
                commands.light_off(id).await?;
            }
            (ActionPolicy::LightDimMode, _) => {
                info!(button = %button, device = %binding.device, "toggling dim mode");
                commands.dim_mode(id).await?;
            }
            (ActionPolicy::FanOn, _) => {
                info!(button = %button, device = %binding.device, "running fan at max speed");
                let props = commands.get_properties(id).await?;
                commands.set_speed(id, props.max_speed).await?;
            }
            (ActionPolicy::FanOff, _) => {
                info!(button = %button, device = %binding.device, "stopping fan");
                commands.set_speed(id, 0).await?;
            }
            (ActionPolicy::FanSpeedUp, Gesture::DoubleClick) => {
                info!(button = %button, device = %binding.device, "maxing out fan speed");
                let props = commands.get_properties(id).await?;
                commands.increase_speed(id, props.max_speed).await?;
            }
            (ActionPolicy::FanSpeedUp, _) => {
                info!(button = %button, device = %binding.device, "increasing fan speed");
                commands.increase_speed(id, 1).await?;
            }
            (ActionPolicy::FanSpeedDown, Gesture::DoubleClick) => {
                info!(button = %button, device = %binding.device, "zeroing out fan speed");
                let props = commands.get_properties(id).await?;
                commands.decrease_speed(id, props.max_speed).await?;
            }
            (ActionPolicy::FanSpeedDown, _) => {
                info!(button = %button, device = %binding.device, "decreasing fan speed");
                commands.decrease_speed(id, 1).await?;
            }
        }

        Ok(true)
    }
}

/// Wire a binding table into the listener registry
///
/// Called once during startup, before the edge source delivers anything.
/// Each binding becomes one listener named `{zone}_{policy}` for log
/// output.
pub fn register_bindings(
    registry: &ListenerRegistry,
    dispatcher: &Arc<Dispatcher>,
    bindings: &[ButtonBinding],
) {
    for binding in bindings {
        let name = format!("{}_{}", binding.zone, binding.policy);
        let dispatcher = Arc::clone(dispatcher);
        let binding = Arc::new(binding.clone());
        let button_ids = [binding.button_id.clone()];
        registry.register(
            &button_ids,
            name,
            move |button, gesture| {
                let dispatcher = Arc::clone(&dispatcher);
                let binding = Arc::clone(&binding);
                async move {
                    dispatcher
                        .dispatch(&binding, &button, gesture)
                        .await
                        .map_err(|err| ListenerError::Failed(err.to_string()))
                }
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use casita_core::{
        CommandResult, DeviceCommands, DeviceId, DeviceProperties, DeviceState,
    };
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Recording stand-in for the hardware bridge
    struct MockBridge {
        devices: Vec<Device>,
        properties: DeviceProperties,
        calls: Mutex<Vec<(String, Instant)>>,
        fail_command: Option<&'static str>,
    }

    impl MockBridge {
        fn with_devices(names: &[(&str, &str)]) -> Self {
            Self {
                devices: names
                    .iter()
                    .map(|(id, name)| Device {
                        device_id: DeviceId::new(*id),
                        name: Some((*name).to_string()),
                        device_type: None,
                        location: None,
                        actions: Vec::new(),
                    })
                    .collect(),
                properties: DeviceProperties {
                    max_speed: 6,
                    trust_state: false,
                },
                calls: Mutex::new(Vec::new()),
                fail_command: None,
            }
        }

        fn record(&self, call: impl Into<String>) -> CommandResult<()> {
            let call = call.into();
            self.calls.lock().unwrap().push((call.clone(), Instant::now()));
            match self.fail_command {
                Some(fail) if call.starts_with(fail) => Err(CommandError::Status {
                    status: 500,
                    body: "mock failure".into(),
                }),
                _ => Ok(()),
            }
        }

        fn call_names(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl DeviceCommands for MockBridge {
        async fn list_devices(&self) -> CommandResult<Vec<DeviceId>> {
            self.record("list_devices")?;
            Ok(self.devices.iter().map(|d| d.device_id.clone()).collect())
        }

        async fn get_device(&self, device: &DeviceId) -> CommandResult<Device> {
            self.record(format!("get_device:{device}"))?;
            self.devices
                .iter()
                .find(|d| &d.device_id == device)
                .cloned()
                .ok_or_else(|| CommandError::Status {
                    status: 404,
                    body: "unknown device".into(),
                })
        }

        async fn get_state(&self, device: &DeviceId) -> CommandResult<DeviceState> {
            self.record(format!("get_state:{device}"))?;
            Ok(DeviceState::default())
        }

        async fn get_properties(&self, device: &DeviceId) -> CommandResult<DeviceProperties> {
            self.record(format!("get_properties:{device}"))?;
            Ok(self.properties.clone())
        }

        async fn set_speed(&self, device: &DeviceId, speed: u32) -> CommandResult<()> {
            self.record(format!("set_speed:{device}:{speed}"))
        }

        async fn increase_speed(&self, device: &DeviceId, step: u32) -> CommandResult<()> {
            self.record(format!("increase_speed:{device}:{step}"))
        }

        async fn decrease_speed(&self, device: &DeviceId, step: u32) -> CommandResult<()> {
            self.record(format!("decrease_speed:{device}:{step}"))
        }

        async fn power_off(&self, device: &DeviceId) -> CommandResult<()> {
            self.record(format!("power_off:{device}"))
        }

        async fn toggle_light(&self, device: &DeviceId) -> CommandResult<()> {
            self.record(format!("toggle_light:{device}"))
        }

        async fn light_on(&self, device: &DeviceId) -> CommandResult<()> {
            self.record(format!("light_on:{device}"))
        }

        async fn light_off(&self, device: &DeviceId) -> CommandResult<()> {
            self.record(format!("light_off:{device}"))
        }

        async fn set_light_belief_state(&self, device: &DeviceId, on: bool) -> CommandResult<()> {
            self.record(format!("set_light_belief_state:{device}:{on}"))
        }

        async fn dim_mode(&self, device: &DeviceId) -> CommandResult<()> {
            self.record(format!("dim_mode:{device}"))
        }
    }

    fn office_binding(policy: ActionPolicy) -> ButtonBinding {
        ButtonBinding {
            button_id: ButtonId::new("142"),
            zone: "office".to_string(),
            device: "Office Ceiling Fan".to_string(),
            policy,
        }
    }

    fn dispatcher(bridge: Arc<MockBridge>, settle: Duration) -> Dispatcher {
        Dispatcher::new(bridge, Arc::new(ZoneLocks::new()), settle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_command_sequences() {
        use ActionPolicy::*;
        use Gesture::*;

        // (policy, gesture, expected calls after resolution)
        let table: &[(ActionPolicy, Gesture, &[&str])] = &[
            (LightToggle, SingleClick, &["toggle_light:fan1"]),
            (LightToggle, DoubleClick, &["toggle_light:fan1"]),
            (LightToggle, LongPress, &["toggle_light:fan1"]),
            (LightOn, SingleClick, &["light_on:fan1"]),
            (
                LightOn,
                DoubleClick,
                &["set_light_belief_state:fan1:false", "light_on:fan1"],
            ),
            (LightOn, LongPress, &["light_on:fan1"]),
            (LightOff, SingleClick, &["light_off:fan1"]),
            (
                LightOff,
                DoubleClick,
                &["set_light_belief_state:fan1:true", "light_off:fan1"],
            ),
            (LightDimMode, SingleClick, &["dim_mode:fan1"]),
            (FanOn, SingleClick, &["get_properties:fan1", "set_speed:fan1:6"]),
            (FanOn, LongPress, &["get_properties:fan1", "set_speed:fan1:6"]),
            (FanOff, DoubleClick, &["set_speed:fan1:0"]),
            (FanSpeedUp, SingleClick, &["increase_speed:fan1:1"]),
            (FanSpeedUp, LongPress, &["increase_speed:fan1:1"]),
            (
                FanSpeedUp,
                DoubleClick,
                &["get_properties:fan1", "increase_speed:fan1:6"],
            ),
            (FanSpeedDown, SingleClick, &["decrease_speed:fan1:1"]),
            (
                FanSpeedDown,
                DoubleClick,
                &["get_properties:fan1", "decrease_speed:fan1:6"],
            ),
        ];

        for (policy, gesture, expected) in table {
            let bridge = Arc::new(MockBridge::with_devices(&[("fan1", "Office Ceiling Fan")]));
            let dispatcher = dispatcher(bridge.clone(), Duration::from_millis(10));

            dispatcher
                .dispatch(&office_binding(*policy), &ButtonId::new("142"), *gesture)
                .await
                .unwrap();

            let calls = bridge.call_names();
            let names: Vec<&str> = calls.iter().map(String::as_str).collect();
            // Resolution always lists then fetches the single device.
            assert_eq!(
                names[..2].to_vec(),
                vec!["list_devices", "get_device:fan1"],
                "{policy} {gesture}"
            );
            assert_eq!(names[2..].to_vec(), expected.to_vec(), "{policy} {gesture}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dim_mode_ignores_other_gestures() {
        let bridge = Arc::new(MockBridge::with_devices(&[("fan1", "Office Ceiling Fan")]));
        let dispatcher = dispatcher(bridge.clone(), Duration::from_millis(10));

        for gesture in [Gesture::DoubleClick, Gesture::LongPress] {
            dispatcher
                .dispatch(
                    &office_binding(ActionPolicy::LightDimMode),
                    &ButtonId::new("141"),
                    gesture,
                )
                .await
                .unwrap();
        }

        // A no-op gesture does not even resolve the device.
        assert!(bridge.call_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_failure_releases_lock() {
        let bridge = Arc::new(MockBridge::with_devices(&[("fan1", "Somewhere Else")]));
        let zones = Arc::new(ZoneLocks::new());
        let dispatcher = Dispatcher::new(bridge, zones.clone(), Duration::from_secs(2));

        let err = dispatcher
            .dispatch(
                &office_binding(ActionPolicy::LightToggle),
                &ButtonId::new("142"),
                Gesture::SingleClick,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::DeviceNotFound { .. }));
        // The zone must be reacquirable immediately.
        assert!(zones.try_acquire("office").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_failure_releases_lock_and_skips_settle() {
        let mut bridge = MockBridge::with_devices(&[("fan1", "Office Ceiling Fan")]);
        bridge.fail_command = Some("toggle_light");
        let bridge = Arc::new(bridge);
        let zones = Arc::new(ZoneLocks::new());
        let dispatcher = Dispatcher::new(bridge, zones.clone(), Duration::from_secs(2));

        let start = Instant::now();
        let err = dispatcher
            .dispatch(
                &office_binding(ActionPolicy::LightToggle),
                &ButtonId::new("142"),
                Gesture::SingleClick,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Command(_)));
        // Failure path neither settles nor leaves the zone held.
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(zones.try_acquire("office").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_zone_dispatch_waits_for_settle() {
        let bridge = Arc::new(MockBridge::with_devices(&[("fan1", "Office Ceiling Fan")]));
        let zones = Arc::new(ZoneLocks::new());
        let settle = Duration::from_millis(2000);
        let dispatcher = Arc::new(Dispatcher::new(bridge.clone(), zones, settle));

        let start = Instant::now();
        let mut handles = Vec::new();
        for i in 0..2u64 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                // Stagger so the first spawn wins the zone lock.
                sleep(Duration::from_millis(1 + i)).await;
                dispatcher
                    .dispatch(
                        &office_binding(ActionPolicy::FanSpeedUp),
                        &ButtonId::new("142"),
                        Gesture::SingleClick,
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let calls = bridge.calls.lock().unwrap();
        let second_start = calls
            .iter()
            .filter(|(name, _)| name == "list_devices")
            .nth(1)
            .map(|(_, at)| *at)
            .unwrap();
        // Handler B could not start until handler A's settle elapsed.
        assert!(second_start.duration_since(start) >= settle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_zones_dispatch_concurrently() {
        let bridge = Arc::new(MockBridge::with_devices(&[
            ("fan1", "Office Ceiling Fan"),
            ("fan2", "Master Bedroom Ceiling Fan"),
        ]));
        let zones = Arc::new(ZoneLocks::new());
        let settle = Duration::from_millis(2000);
        let dispatcher = Arc::new(Dispatcher::new(bridge.clone(), zones, settle));

        let bedroom = ButtonBinding {
            button_id: ButtonId::new("134"),
            zone: "master_bedroom".to_string(),
            device: "Master Bedroom Ceiling Fan".to_string(),
            policy: ActionPolicy::FanSpeedUp,
        };

        let start = Instant::now();
        let office_task = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(
                        &office_binding(ActionPolicy::FanSpeedUp),
                        &ButtonId::new("142"),
                        Gesture::SingleClick,
                    )
                    .await
                    .unwrap();
            })
        };
        let bedroom_task = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&bedroom, &ButtonId::new("134"), Gesture::SingleClick)
                    .await
                    .unwrap();
            })
        };
        office_task.await.unwrap();
        bedroom_task.await.unwrap();

        // Neither zone waited out the other's settle delay.
        assert!(start.elapsed() < settle * 2);
        let calls = bridge.calls.lock().unwrap();
        for (_, at) in calls.iter() {
            assert!(at.duration_since(start) < settle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_bindings_wires_registry() {
        let bridge = Arc::new(MockBridge::with_devices(&[("fan1", "Office Ceiling Fan")]));
        let dispatcher = Arc::new(dispatcher(bridge.clone(), Duration::from_millis(10)));
        let registry = ListenerRegistry::new();

        register_bindings(
            &registry,
            &dispatcher,
            &[
                office_binding(ActionPolicy::LightToggle),
                ButtonBinding {
                    button_id: ButtonId::new("143"),
                    zone: "office".to_string(),
                    device: "Office Ceiling Fan".to_string(),
                    policy: ActionPolicy::FanSpeedDown,
                },
            ],
        );

        assert_eq!(registry.listener_count(), 2);
        registry
            .dispatch(&ButtonId::new("142"), Gesture::SingleClick)
            .await;
        assert!(bridge
            .call_names()
            .contains(&"toggle_light:fan1".to_string()));
    }
}
