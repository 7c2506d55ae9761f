pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use mstone_domain::config::{FaultPolicyConfig, LifecycleConfig};
    use mstone_domain::{ActiveModuleInfo, FeatureId, LifecycleFlags, ModuleId, ModuleStatus};
    use mstone_event_bus::EventBus;
    use mstone_kernel::catalog::ModuleCatalog;
    use mstone_kernel::lifecycle::{LifecycleEngine, LifecycleEvent, Operation};
    use mstone_kernel::processor::FaultKind;
    use mstone_kernel::registry::FeatureRegistry;
    use std::time::Duration;

    fn slot(module: &ModuleId, status: ModuleStatus) -> Option<ActiveModuleInfo> {
        Some(ActiveModuleInfo::new(module.clone(), status))
    }

    #[tokio::test]
    async fn test_initial_state() {
        let engine = engine_with(FakeProcessor::healthy());

        assert_eq!(engine.current_status(), ModuleStatus::Unloaded);
        assert!(engine.active_module().is_none());
        assert!(engine.flags().is_idle());
        assert_eq!(engine.stats(), Default::default());
    }

    #[tokio::test]
    async fn test_load_and_unload_module01() {
        let tools = FakeProcessor::healthy();
        let engine = engine_with(tools.clone());
        let module01 = ModuleId::tools();

        assert_eq!(engine.load(&module01).await, ModuleStatus::Success);
        assert_eq!(engine.active_module(), slot(&module01, ModuleStatus::Success));
        assert_eq!(engine.current_status(), ModuleStatus::Success);
        assert!(engine.flags().is_idle());
        assert_eq!(tools.init_calls(), 1);

        assert_eq!(engine.unload(&module01).await, ModuleStatus::Unloaded);
        assert!(engine.active_module().is_none(), "successful unload clears the slot");
        assert_eq!(engine.current_status(), ModuleStatus::Unloaded);
        assert_eq!(tools.cleanup_calls(), 1);
    }

    #[tokio::test]
    async fn test_placeholders_always_succeed() {
        let tools = FakeProcessor::always(Step::Decline);
        let engine = engine_with(tools.clone());

        for number in 2..=13 {
            let module = ModuleId::numbered(number);
            assert_eq!(engine.load(&module).await, ModuleStatus::Success, "{module}");
            assert_eq!(engine.active_module(), slot(&module, ModuleStatus::Success));
        }
        assert_eq!(tools.init_calls(), 0);
        assert_eq!(engine.stats().swaps, 11);
    }

    #[tokio::test]
    async fn test_unknown_modules_are_invalid() {
        let tools = FakeProcessor::healthy();
        let engine = engine_with(tools.clone());

        for name in ["Module00", "Module14", "module01", "Scanner", ""] {
            let module = ModuleId::from(name);

            assert_eq!(engine.load(&module).await, ModuleStatus::Invalid, "{name}");
            assert_eq!(engine.active_module(), slot(&module, ModuleStatus::Invalid));
            assert_eq!(engine.current_status(), ModuleStatus::Invalid);

            assert_eq!(engine.unload(&module).await, ModuleStatus::Invalid, "{name}");
            assert_eq!(engine.active_module(), slot(&module, ModuleStatus::Invalid));
            assert!(engine.flags().is_idle());
        }
        assert_eq!(tools.init_calls() + tools.cleanup_calls(), 0);
    }

    #[tokio::test]
    async fn test_declined_initialization_is_failed() {
        let engine = engine_with(FakeProcessor::always(Step::Decline));
        let module01 = ModuleId::tools();

        assert_eq!(engine.load(&module01).await, ModuleStatus::Failed);
        assert_eq!(engine.active_module(), slot(&module01, ModuleStatus::Failed));
        assert!(engine.flags().is_idle());
    }

    #[tokio::test]
    async fn test_faults_follow_the_default_policy() {
        let cases = [
            (FaultKind::Io, ModuleStatus::Failed),
            (FaultKind::Timeout, ModuleStatus::Failed),
            (FaultKind::IllegalState, ModuleStatus::Error),
            (FaultKind::MissingResource, ModuleStatus::Crashed),
            (FaultKind::Unknown, ModuleStatus::Crashed),
        ];

        for (kind, expected) in cases {
            let engine = engine_with(FakeProcessor::always(Step::Fault(kind)));
            assert_eq!(engine.load(&ModuleId::tools()).await, expected, "{kind}");
            assert_eq!(engine.active_module(), slot(&ModuleId::tools(), expected));
            assert!(engine.flags().is_idle(), "flags leaked after {kind}");
        }
    }

    #[tokio::test]
    async fn test_processor_panic_is_crashed_and_releases_flags() {
        let engine = engine_with(FakeProcessor::always(Step::Panic));

        assert_eq!(engine.load(&ModuleId::tools()).await, ModuleStatus::Crashed);
        assert!(engine.flags().is_idle());

        // The engine stays usable.
        assert_eq!(engine.load(&ModuleId::numbered(2)).await, ModuleStatus::Success);
    }

    #[tokio::test]
    async fn test_hanging_processor_times_out_without_leaking_flags() {
        let engine = engine_with(FakeProcessor::always(Step::Stall(Duration::from_millis(800))));
        assert_eq!(engine.operation_timeout(), Duration::from_millis(500));

        let status = engine.load(&ModuleId::tools()).await;

        assert_eq!(status, ModuleStatus::Error);
        assert_eq!(engine.current_status(), ModuleStatus::Error);
        assert_eq!(engine.active_module(), slot(&ModuleId::tools(), ModuleStatus::Error));
        assert!(engine.flags().is_idle(), "loading flag must be clear right after a timeout");
    }

    #[tokio::test]
    async fn test_concurrent_operations_fail_fast() {
        let engine = engine_with(FakeProcessor::always(Step::Stall(Duration::from_millis(50))));
        let module01 = ModuleId::tools();
        let module02 = ModuleId::numbered(2);

        let (first, second, third) =
            tokio::join!(engine.load(&module01), engine.load(&module02), engine.unload(&module01));

        assert_eq!(first, ModuleStatus::Success);
        assert_eq!(second, ModuleStatus::Failed);
        assert_eq!(third, ModuleStatus::Failed);
        assert_eq!(engine.active_module(), slot(&module01, ModuleStatus::Success));

        let stats = engine.stats();
        assert_eq!((stats.loads, stats.unloads, stats.rejected), (1, 0, 2));
    }

    #[tokio::test]
    async fn test_flags_are_exclusive_while_running() {
        let engine = engine_with(FakeProcessor::always(Step::Stall(Duration::from_millis(30))));

        let probe = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            engine.flags()
        };
        let tools_id = ModuleId::tools();
        let (status, observed) = tokio::join!(engine.load(&tools_id), probe);

        assert_eq!(status, ModuleStatus::Success);
        assert_eq!(observed, LifecycleFlags::LOADING);
        assert!(engine.flags().is_idle());
    }

    #[tokio::test]
    async fn test_load_swaps_out_the_active_module() {
        let tools = FakeProcessor::healthy();
        let engine = engine_with(tools.clone());
        let module01 = ModuleId::tools();

        engine.load(&module01).await;
        assert_eq!(engine.load(&ModuleId::numbered(5)).await, ModuleStatus::Success);
        assert_eq!(tools.cleanup_calls(), 1);
        assert_eq!(engine.active_module(), slot(&ModuleId::numbered(5), ModuleStatus::Success));

        // Reloading the same module goes through cleanup and initialize again.
        engine.load(&module01).await;
        assert_eq!(engine.load(&module01).await, ModuleStatus::Success);
        assert_eq!((tools.init_calls(), tools.cleanup_calls()), (3, 2));
        assert_eq!(engine.stats().swaps, 3);
    }

    #[tokio::test]
    async fn test_unknown_load_leaves_the_active_module_running() {
        let tools = FakeProcessor::healthy();
        let bus = EventBus::new();
        let mut rx = bus.subscribe::<LifecycleEvent>().unwrap();
        let engine = LifecycleEngine::builder()
            .catalog(ModuleCatalog::standard(tools.clone()))
            .event_bus(bus)
            .build()
            .unwrap();
        engine.load(&ModuleId::tools()).await;
        while rx.try_recv().is_ok() {}

        assert_eq!(engine.load(&ModuleId::numbered(14)).await, ModuleStatus::Invalid);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push((event.module.to_string(), event.status));
        }
        assert_eq!(seen, [("Module14".to_owned(), ModuleStatus::Invalid)]);
        assert_eq!(engine.stats().swaps, 0);
        assert_eq!(tools.cleanup_calls(), 0);
        assert_eq!(engine.active_module(), slot(&ModuleId::numbered(14), ModuleStatus::Invalid));
    }

    #[tokio::test]
    async fn test_failed_swap_does_not_block_the_load() {
        let tools = FakeProcessor::with_defaults(Step::Succeed, Step::Decline);
        let engine = engine_with(tools.clone());

        engine.load(&ModuleId::tools()).await;
        assert_eq!(engine.load(&ModuleId::numbered(3)).await, ModuleStatus::Success);
        assert_eq!(engine.active_module(), slot(&ModuleId::numbered(3), ModuleStatus::Success));
        assert_eq!(tools.cleanup_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_operation_releases_its_claim() {
        let engine = engine_with(FakeProcessor::always(Step::Stall(Duration::from_millis(200))));

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), engine.load(&ModuleId::tools())).await;

        assert!(cancelled.is_err(), "the load should still be running");
        assert!(engine.flags().is_idle());
        assert_eq!(engine.current_status(), ModuleStatus::Error);
        assert_eq!(engine.active_module(), slot(&ModuleId::tools(), ModuleStatus::Error));
    }

    #[tokio::test]
    async fn test_events_follow_every_transition() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe::<LifecycleEvent>().unwrap();
        let engine = LifecycleEngine::builder()
            .catalog(ModuleCatalog::standard(FakeProcessor::healthy()))
            .event_bus(bus)
            .build()
            .unwrap();

        engine.load(&ModuleId::tools()).await;
        engine.load(&ModuleId::numbered(2)).await;

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push((event.module.to_string(), event.operation, event.status));
        }

        let expected = [
            ("Module01", Operation::Load, ModuleStatus::Loading),
            ("Module01", Operation::Load, ModuleStatus::Success),
            ("Module01", Operation::Unload, ModuleStatus::Unloading),
            ("Module01", Operation::Unload, ModuleStatus::Unloaded),
            ("Module02", Operation::Load, ModuleStatus::Loading),
            ("Module02", Operation::Load, ModuleStatus::Success),
        ]
        .map(|(module, op, status)| (module.to_owned(), op, status));
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_observers_replay_latest_value() {
        let engine = engine_with(FakeProcessor::healthy());
        engine.load(&ModuleId::tools()).await;

        let status = engine.subscribe_status();
        let active = engine.subscribe_active();
        assert_eq!(*status.borrow(), ModuleStatus::Success);
        assert_eq!(*active.borrow(), slot(&ModuleId::tools(), ModuleStatus::Success));
    }

    #[tokio::test]
    async fn test_settled_status_waits_for_the_running_operation() {
        let engine = engine_with(FakeProcessor::always(Step::Stall(Duration::from_millis(40))));

        let waiter = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(engine.current_status(), ModuleStatus::Loading);
            let settled = engine.settled_status(Duration::from_secs(2)).await;
            (settled, engine.wait_idle(Duration::from_secs(2)).await)
        };
        let tools_id = ModuleId::tools();
        let (status, (settled, idle)) = tokio::join!(engine.load(&tools_id), waiter);

        assert_eq!(status, ModuleStatus::Success);
        assert_eq!(settled, Some(ModuleStatus::Success));
        assert!(idle);
    }

    #[tokio::test]
    async fn test_settled_status_gives_up_at_the_deadline() {
        let engine = engine_with(FakeProcessor::always(Step::Stall(Duration::from_millis(150))));

        let waiter = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            (
                engine.settled_status(Duration::from_millis(10)).await,
                engine.wait_idle(Duration::from_millis(10)).await,
            )
        };
        let tools_id = ModuleId::tools();
        let (_, (settled, idle)) = tokio::join!(engine.load(&tools_id), waiter);

        assert_eq!(settled, None);
        assert!(!idle);
    }

    #[tokio::test]
    async fn test_feature_helpers_resolve_through_the_registry() {
        let engine = engine_with(FakeProcessor::healthy());
        let registry = FeatureRegistry::standard();

        assert_eq!(engine.load_feature(&registry, &FeatureId::ocr()).await, ModuleStatus::Success);
        assert_eq!(
            engine.unload_feature(&registry, &FeatureId::word()).await,
            ModuleStatus::Unloaded
        );

        let unknown = FeatureId::from("UNKNOWN_FEATURE");
        assert_eq!(engine.load_feature(&registry, &unknown).await, ModuleStatus::Failed);
        assert_eq!(engine.unload_feature(&registry, &unknown).await, ModuleStatus::Failed);
        assert_eq!((engine.stats().loads, engine.stats().unloads), (1, 1));
    }

    #[tokio::test]
    async fn test_fault_policy_comes_from_config() {
        let config = LifecycleConfig {
            operation_timeout_ms: 100,
            faults: FaultPolicyConfig { io: ModuleStatus::Crashed, ..FaultPolicyConfig::default() },
        };
        let engine = LifecycleEngine::builder()
            .catalog(ModuleCatalog::standard(FakeProcessor::always(Step::Fault(FaultKind::Io))))
            .config(&config)
            .build()
            .unwrap();

        assert_eq!(engine.operation_timeout(), Duration::from_millis(100));
        assert_eq!(engine.load(&ModuleId::tools()).await, ModuleStatus::Crashed);
    }

    #[test]
    fn test_builder_rejects_bad_settings() {
        assert!(LifecycleEngine::builder().operation_timeout(Duration::ZERO).build().is_err());

        let config = LifecycleConfig {
            faults: FaultPolicyConfig { panic: ModuleStatus::Success, ..FaultPolicyConfig::default() },
            ..LifecycleConfig::default()
        };
        assert!(LifecycleEngine::builder().config(&config).build().is_err());
    }
}
