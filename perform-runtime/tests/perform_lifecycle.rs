//! 表演完整生命周期的集成测试：从注册、触发到逐帧推进结束。

use perform_runtime::{
    EffectHandle, LayerChoice, PerformConfig, PerformError, PerformStage, ScreenGeometry, builtin,
    compute_visual_state, resolve,
};

fn stage() -> PerformStage {
    PerformStage::new(&PerformConfig::default()).unwrap()
}

fn opacities(handle: &EffectHandle) -> Vec<f32> {
    handle
        .container
        .borrow()
        .children
        .iter()
        .map(|n| n.borrow().opacity)
        .collect()
}

/// 逐帧推进直到表演结束，返回经过的帧数
fn run_to_end(stage: &mut PerformStage, key: &str) -> u32 {
    let mut frames = 0;
    while stage.is_active(key) {
        stage.update(1.0);
        frames += 1;
        assert!(frames < 1000, "表演没有结束: {key}");
    }
    frames
}

#[test]
fn test_every_builtin_ends_transparent_and_unregistered() {
    let mut stage = stage();
    for name in stage.registry().names() {
        let handle = stage.perform(&name).unwrap();
        run_to_end(&mut stage, &handle.registry_key);

        let values = opacities(&handle);
        assert!(values.iter().all(|o| *o == 0.0), "{name}: {values:?}");
        assert!(!stage.is_active(&handle.registry_key));
    }
    assert_eq!(stage.active_count(), 0);
    // 节点只被隐藏，不会被移出场景层
    assert_eq!(stage.scene().layer(LayerChoice::Foreground).len(), 5);
}

#[test]
fn test_blink_through_stage() {
    let mut stage = stage();
    let handle = stage.perform("enAnswer").unwrap();

    // 0.05s
    stage.update(3.0);
    assert_eq!(opacities(&handle), vec![1.0]);
    // 0.15s
    stage.update(6.0);
    assert_eq!(opacities(&handle), vec![0.0]);
    // 0.25s
    stage.update(6.0);
    assert_eq!(opacities(&handle), vec![1.0]);
}

#[test]
fn test_staggered_reveal_through_stage() {
    let mut stage = stage();
    let handle = stage.perform("enBubbleOmit").unwrap();

    // 0.5s
    stage.update(30.0);
    assert_eq!(opacities(&handle), vec![1.0, 1.0, 1.0, 0.0]);
    // 1.0s
    stage.update(30.0);
    assert_eq!(opacities(&handle), vec![1.0; 4]);

    run_to_end(&mut stage, &handle.registry_key);
    assert!(!handle.container.borrow().visible);
}

#[test]
fn test_eased_translation_is_monotonic() {
    let screen = ScreenGeometry::default();
    let perform = resolve(&builtin::en_hmm(), &screen).unwrap();
    let start_x = perform.anchor.x;

    let mut last = 0.0f32;
    for frame in 0..=120 {
        let t = frame as f32 / 60.0;
        let x = compute_visual_state(t, &perform)[0].position.x;
        let magnitude = (x - start_x).abs();
        assert!(magnitude + 1e-4 >= last, "t = {t}");
        last = magnitude;
    }

    let start = compute_visual_state(0.0, &perform)[0].position.x;
    let end = compute_visual_state(1.5, &perform)[0].position.x;
    assert_eq!(start, start_x);
    assert!((end - (start_x - 65.0)).abs() < 1e-3);
}

#[test]
fn test_visual_state_is_deterministic() {
    let screen = ScreenGeometry::default();
    for def in builtin::all() {
        let perform = resolve(&def, &screen).unwrap();
        for t in [-1.0, 0.0, 0.3, 0.77, 1.5, 2.2, 100.0] {
            assert_eq!(
                compute_visual_state(t, &perform),
                compute_visual_state(t, &perform),
                "{} @ {t}",
                def.name
            );
        }
    }
}

#[test]
fn test_negative_elapsed_does_not_panic() {
    let perform = resolve(&builtin::en_bubble_suki(), &ScreenGeometry::default()).unwrap();
    let states = compute_visual_state(-5.0, &perform);
    assert!(states.iter().all(|s| (0.0..=1.0).contains(&s.opacity)));
}

#[test]
fn test_cancel_mid_flight() {
    let mut stage = stage();
    let handle = stage.perform("enBubbleSuki").unwrap();
    stage.update(20.0);

    assert!(stage.cancel(&handle.registry_key));
    assert_eq!(opacities(&handle), vec![0.0, 0.0]);
    assert!(stage.update(1.0).is_empty());
}

#[test]
fn test_duplicate_invocation_is_rejected_without_side_effects() {
    let mut stage = stage();
    stage.perform("enSweat").unwrap();
    let err = stage.perform("enSweat").unwrap_err();
    assert!(matches!(err, PerformError::DuplicateKey { .. }));
    assert_eq!(stage.scene().layer(LayerChoice::Foreground).len(), 1);
    assert_eq!(stage.active_count(), 1);
}

#[test]
fn test_definition_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perform.json");
    std::fs::write(
        &path,
        r#"{
            "screen": { "width": 1000, "height": 1000 },
            "disabled": ["enAnswer"],
            "definitions": [{
                "name": "bgFlash",
                "ticker_key": "bg-flash-ticker",
                "layer": "background",
                "anchor": { "x": 0.5, "y": 0.5 },
                "layers": [{ "name": "flash", "texture": "./game/tex/flash.png" }],
                "timeline": {
                    "duration": 0.5,
                    "opacity": { "kind": "trailing_fade", "fade_out": 0.5 }
                }
            }]
        }"#,
    )
    .unwrap();

    let config = PerformConfig::load(&path);
    config.validate().unwrap();

    let mut stage = PerformStage::new(&config).unwrap();
    assert!(!stage.registry().contains("enAnswer"));

    let handle = stage.perform("bgFlash").unwrap();
    assert_eq!(stage.scene().layer(LayerChoice::Background).len(), 1);
    {
        let container = handle.container.borrow();
        let node = container.children[0].borrow();
        assert_eq!(node.position.x, 500.0);
        assert_eq!(node.position.y, 500.0);
    }

    let frames = run_to_end(&mut stage, "bg-flash-ticker");
    assert!((29..=31).contains(&frames), "frames = {frames}");
}
