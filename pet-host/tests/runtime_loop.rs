//! # 运行循环集成测试
//!
//! start → tick → stop 生命周期，以及宿主接口（音量、动作、渲染器重建、注册表）。

mod common;

use common::*;
use pet_host::engine::MotionPriority;
use pet_host::{
    FrameRequest, LoadStage, MemoryConfigStore, MotionQueueHandle, PetError, PetRegistry,
    PointerEvent, RuntimeOptions, RuntimeState, TapOutcome,
};
use pet_runtime::SurfaceSize;
use serde_json::json;

async fn started(fixture: PetFixture) -> Harness {
    let mut harness = Harness::new(fixture);
    harness.runtime.start().await.expect("start");
    harness
}

#[tokio::test]
async fn test_start_applies_shield_parts_and_default_expression() {
    let h = started(PetFixture::new()).await;

    assert_eq!(h.runtime.state(), RuntimeState::Running);
    assert!(h.runtime.model().is_some_and(|m| m.is_loaded()));

    let engine = h.engine.borrow();
    assert_eq!(engine.part_opacity, vec![("PartArmB".to_string(), 0.0)]);
    assert_eq!(engine.current_expression.as_deref(), Some("normal"));

    assert_eq!(h.surface.borrow().frames_requested, 1);
    assert!(h.runtime.has_pending_frame());
}

#[tokio::test]
async fn test_hidden_parts_still_hit_test() {
    let mut h = started(PetFixture::new()).await;

    // PartArmB 透明度为 0，头部区域照常命中
    let event = PointerEvent::primary(1, 100.0, 50.0);
    h.runtime.on_pointer_down(&event);
    let outcome = h.runtime.on_pointer_up(&event).await.expect("tap");

    assert!(matches!(outcome, TapOutcome::Silent { region: 0, .. }));
    assert_eq!(h.engine.borrow().hit_tests, vec!["ArtMesh_Head".to_string()]);
}

#[tokio::test]
async fn test_unknown_shield_part_is_not_fatal() {
    let mut config = default_config();
    config["shieldPartList"] = json!(["PartMissing"]);
    let h = started(PetFixture::with(config, default_settings())).await;

    assert_eq!(h.runtime.state(), RuntimeState::Running);
    assert!(h.engine.borrow().part_opacity.is_empty());
}

#[tokio::test]
async fn test_unknown_default_expression_is_not_fatal() {
    let mut config = default_config();
    config["defaultExpression"] = json!("sleepy");
    let h = started(PetFixture::with(config, default_settings())).await;

    assert_eq!(h.runtime.state(), RuntimeState::Running);
    assert!(h.engine.borrow().current_expression.is_none());
}

#[tokio::test]
async fn test_tick_update_order() {
    let mut h = started(PetFixture::new()).await;
    h.engine.borrow_mut().calls.clear();

    h.advance(16.0);

    let calls = h.engine.borrow().calls.clone();
    assert_eq!(
        calls,
        vec![
            "load_parameters",
            "save_parameters",
            "update_eye_blink",
            "update_expression",
            "add:ParamAngleX",
            "add:ParamAngleY",
            "add:ParamAngleZ",
            "add:ParamBodyAngleX",
            "add:ParamEyeBallX",
            "add:ParamEyeBallY",
            "update_breath",
            "evaluate_physics",
            "commit_parameters",
        ]
    );
    assert_eq!(h.engine.borrow().draws, 1);
    assert_eq!(h.surface.borrow().frames_requested, 2);
}

#[tokio::test]
async fn test_motion_suppresses_eye_blink() {
    let mut h = started(PetFixture::new()).await;
    h.engine.borrow_mut().motion_finished = false;
    h.engine.borrow_mut().calls.clear();

    h.advance(16.0);

    let calls = h.engine.borrow().calls.clone();
    assert_eq!(&calls[..3], &["load_parameters", "update_motion", "save_parameters"]);
    assert!(!calls.iter().any(|call| call == "update_eye_blink"));
}

#[tokio::test]
async fn test_tick_before_start_does_nothing() {
    let mut h = Harness::new(PetFixture::new());
    h.advance(16.0);

    assert_eq!(h.engine.borrow().draws, 0);
    assert_eq!(h.surface.borrow().frames_requested, 0);
    assert_eq!(h.runtime.state(), RuntimeState::Created);
}

#[tokio::test]
async fn test_stop_before_start_is_safe() {
    let mut h = Harness::new(PetFixture::new());

    h.runtime.stop();
    assert_eq!(h.runtime.state(), RuntimeState::Stopped);
    assert!(h.surface.borrow().removed);
    assert!(h.surface.borrow().frames_cancelled.is_empty());

    // 重复调用无副作用
    h.runtime.stop();
    assert_eq!(h.audio.borrow().stops, 1);

    // 停止后不能再启动
    h.runtime.start().await.expect("start after stop");
    assert_eq!(h.runtime.state(), RuntimeState::Stopped);
    assert!(!h.engine.borrow().model_loaded);
}

#[tokio::test]
async fn test_stop_tears_everything_down() {
    let mut h = started(PetFixture::new()).await;
    h.advance(16.0);

    h.runtime.stop();

    assert_eq!(h.runtime.state(), RuntimeState::Stopped);
    assert_eq!(h.surface.borrow().frames_cancelled, vec![FrameRequest(2)]);
    assert!(h.surface.borrow().removed);
    assert_eq!(h.audio.borrow().stops, 1);
    assert!(h.caption.borrow().cleared);
    {
        let engine = h.engine.borrow();
        assert!(engine.disposed);
        assert!(!engine.renderer);
        assert!(engine.expressions.is_empty());
        assert!(engine.motions.is_empty());
    }
    assert!(h.runtime.model().is_none());

    let draws = h.engine.borrow().draws;
    h.advance(16.0);
    assert_eq!(h.engine.borrow().draws, draws);
    assert_eq!(h.surface.borrow().frames_requested, 2);
}

#[tokio::test]
async fn test_stop_clears_pending_reversions() {
    let mut h = started(PetFixture::new()).await;

    let event = PointerEvent::primary(1, 100.0, 50.0);
    h.runtime.on_pointer_down(&event);
    h.runtime.on_pointer_up(&event).await.expect("tap");
    assert_eq!(h.current_expression().as_deref(), Some("smile"));

    h.runtime.stop();
    h.advance(1000.0);
    assert_eq!(h.current_expression().as_deref(), Some("smile"));
}

#[tokio::test]
async fn test_failed_load_does_not_start_frames() {
    let fixture = PetFixture::new();
    fixture.source.remove(&PetFixture::model_path("hiyori.moc3"));
    let mut h = Harness::new(fixture);

    let err = h.runtime.start().await.unwrap_err();
    assert!(matches!(
        err,
        PetError::FatalLoad {
            stage: LoadStage::Model,
            ..
        }
    ));
    assert_eq!(h.runtime.state(), RuntimeState::Failed);
    assert_eq!(h.surface.borrow().frames_requested, 0);
    assert!(h.engine.borrow().disposed);
    assert!(h.runtime.model().is_none());

    h.advance(16.0);
    assert_eq!(h.engine.borrow().draws, 0);

    h.runtime.stop();
    assert_eq!(h.runtime.state(), RuntimeState::Stopped);
}

#[tokio::test]
async fn test_missing_config_fails_start() {
    let fixture = PetFixture::new();
    fixture.source.remove("hiyori/config_pet.json");
    let mut h = Harness::new(fixture);

    let err = h.runtime.start().await.unwrap_err();
    assert!(matches!(err, PetError::Config(_)));
    assert_eq!(h.runtime.state(), RuntimeState::Failed);
    assert!(!h.engine.borrow().model_loaded);
}

#[tokio::test]
async fn test_undrawable_surface_fails_start() {
    let mut h = Harness::new(PetFixture::new());
    h.surface.borrow_mut().size = SurfaceSize::new(0.0, 0.0);

    let err = h.runtime.start().await.unwrap_err();
    assert!(matches!(err, PetError::Surface(_)));
    assert_eq!(h.runtime.state(), RuntimeState::Failed);
}

#[tokio::test]
async fn test_config_store_override() {
    let mut config = default_config();
    config["defaultExpression"] = json!("angry");

    let Harness {
        runtime,
        engine,
        ..
    } = Harness::new(PetFixture::new());
    let mut runtime = runtime.with_config_store(Box::new(MemoryConfigStore::new(config)));

    runtime.start().await.expect("start");
    assert_eq!(engine.borrow().current_expression.as_deref(), Some("angry"));
}

#[tokio::test]
async fn test_start_twice_loads_once() {
    let mut h = started(PetFixture::new()).await;
    h.runtime.start().await.expect("second start");

    assert_eq!(h.engine.borrow().renderers_created, 1);
    assert_eq!(h.surface.borrow().frames_requested, 1);
}

#[tokio::test]
async fn test_volume() {
    let options = RuntimeOptions {
        volume: 30,
        ..RuntimeOptions::default()
    };
    let mut h = Harness::with_options(
        PetFixture::new(),
        options,
        Box::new(pet_runtime::ScriptedRandom::new([])),
    );
    h.runtime.start().await.expect("start");
    assert!((h.audio.borrow().volume - 0.3).abs() < 1e-6);

    h.runtime.change_volume(50.0);
    assert_eq!(h.runtime.audio().volume(), 0.5);

    h.runtime.change_volume(150.0);
    assert_eq!(h.runtime.audio().volume(), 1.0);

    h.runtime.change_volume(-5.0);
    assert_eq!(h.runtime.audio().volume(), 0.0);
}

#[tokio::test]
async fn test_start_cached_motion_rebinds_callback() {
    let mut h = started(PetFixture::new()).await;

    let handle = h
        .runtime
        .start_motion("TapBody", 0, MotionPriority::Normal, Some(Box::new(|_: &str| {})))
        .await;

    assert!(handle.is_valid());
    let engine = h.engine.borrow();
    assert_eq!(engine.started_motions, vec!["TapBody_0".to_string()]);
    assert!(engine.finished_callbacks.values().any(|bound| *bound));
}

#[tokio::test]
async fn test_denied_reservation_returns_invalid_handle() {
    let mut h = started(PetFixture::new()).await;
    h.engine.borrow_mut().allow_reserve = false;

    let handle = h
        .runtime
        .start_motion("Idle", 0, MotionPriority::Idle, None)
        .await;

    assert_eq!(handle, MotionQueueHandle::INVALID);
    assert!(h.engine.borrow().started_motions.is_empty());
}

#[tokio::test]
async fn test_undeclared_motion_returns_invalid_handle() {
    let mut h = started(PetFixture::new()).await;

    let handle = h
        .runtime
        .start_motion("Shake", 0, MotionPriority::Force, None)
        .await;

    assert!(!handle.is_valid());
    assert!(h.engine.borrow().started_motions.is_empty());
}

#[tokio::test]
async fn test_uncached_motion_is_fetched_and_configured() {
    let mut h = started(PetFixture::new()).await;
    if let Some(model) = h.runtime.model_mut() {
        model.release_resources();
    }
    assert_eq!(h.runtime.model().map(|m| m.motion_count()), Some(0));

    let handle = h
        .runtime
        .start_motion("Idle", 0, MotionPriority::Normal, None)
        .await;

    assert!(handle.is_valid());
    assert!(h.runtime.model().is_some_and(|m| m.has_motion("Idle_0")));

    let engine = h.engine.borrow();
    assert_eq!(engine.started_motions, vec!["Idle_0".to_string()]);
    let (motion, _) = engine
        .motions
        .iter()
        .find(|(_, name)| name.as_str() == "Idle_0")
        .expect("motion loaded");
    let config = engine.motion_configs.get(motion).expect("configured");
    assert_eq!(config.fade_in, Some(0.5));
    assert_eq!(config.lip_sync_ids, vec!["ParamMouthOpenY"]);
}

#[tokio::test]
async fn test_reload_renderer() {
    let mut h = started(PetFixture::new()).await;
    h.runtime.reload_renderer().await.expect("reload");

    let engine = h.engine.borrow();
    assert_eq!(engine.renderers_created, 2);
    assert_eq!(engine.textures.len(), 2);
}

#[tokio::test]
async fn test_resize_updates_coordinates() {
    let mut h = started(PetFixture::new()).await;
    h.surface.borrow_mut().size = SurfaceSize::new(400.0, 200.0);

    h.runtime.on_resize();

    let surface = h.runtime.coords().surface();
    assert_eq!(surface.logical_width, 400.0);
    assert_eq!(surface.physical_width(), 500.0);
}

#[tokio::test]
async fn test_physical_scale_applied_to_coordinates() {
    let h = started(PetFixture::new()).await;

    let surface = h.runtime.coords().surface();
    assert_eq!(surface.physical_scale, pet_runtime::DEFAULT_PHYSICAL_SCALE);
    let (x, y) = h.runtime.coords().device_to_model(100.0, 100.0);
    assert!(x.abs() < 1e-4 && y.abs() < 1e-4);
}

#[tokio::test]
async fn test_registry_owns_runtimes() {
    let mut registry = PetRegistry::new();
    let first = started(PetFixture::new()).await;
    let second = started(PetFixture::new()).await;
    let first_engine = first.engine.clone();
    let second_surface = second.surface.clone();

    let a = registry.create(first);
    let b = registry.create(second);

    for (_, harness) in registry.iter_mut() {
        harness.advance(16.0);
    }
    assert_eq!(first_engine.borrow().draws, 1);

    let mut removed = registry.remove(b).expect("registered");
    removed.runtime.stop();
    assert!(second_surface.borrow().removed);
    assert!(registry.get(b).is_none());
    assert!(registry.get(a).is_some());
}
