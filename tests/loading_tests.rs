use lagoon::app::AppContext;
use lagoon::config::LagoonConfig;
use lagoon::core::{FrameClock, ManualTime, RevealEvent, Viewport};
use lagoon::loaders::ModelData;
use lagoon::loading::{AssetResult, LoadEvent, LoadFailurePolicy, LoadingManager};
use lagoon::uniforms::ALPHA;

mod common;
use common::NullRenderer;

fn loaded(url: &str) -> AssetResult {
    AssetResult {
        url: url.to_string(),
        result: Ok(ModelData::default()),
    }
}

fn failed(url: &str) -> AssetResult {
    AssetResult {
        url: url.to_string(),
        result: Err(anyhow::anyhow!("404")),
    }
}

fn context(time: &ManualTime, config: LagoonConfig) -> AppContext {
    AppContext::new(config, FrameClock::new(Box::new(time.clone())), Viewport::new(800, 600, 1.0))
        .unwrap()
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_two_items_report_progress_then_complete_once() {
        let mut manager = LoadingManager::new(LoadFailurePolicy::CountAsLoaded);
        manager.item_start("a.gltf");
        manager.item_start("b.gltf");

        let events = manager.item_end("a.gltf");
        assert_eq!(
            events,
            vec![LoadEvent::Progress {
                url: "a.gltf".to_string(),
                items_loaded: 1,
                items_total: 2
            }]
        );
        assert_eq!(manager.progress().ratio(), 0.5);

        let events = manager.item_end("b.gltf");
        assert_eq!(events.last(), Some(&LoadEvent::Completed));
        assert_eq!(manager.progress().ratio(), 1.0);

        // Terminal: nothing more comes out after completion
        assert!(manager.item_start("c.gltf").is_empty());
        assert!(manager.item_end("c.gltf").is_empty());
    }

    #[test]
    fn test_reveal_runs_after_completion() {
        let time = ManualTime::new();
        let mut app = context(&time, LagoonConfig::default());
        let mut renderer = NullRenderer::default();

        app.track_asset("palm.gltf");
        app.apply_asset_result(loaded("palm.gltf"));
        assert_eq!(app.load_events().last(), Some(&LoadEvent::Completed));
        assert!(app.reveal.is_started());
        assert!(!app.bar.is_ended());

        time.set(0.25);
        app.tick(&mut renderer).unwrap();
        assert!(!app.bar.is_ended(), "bar ends only after the hold");

        time.set(0.5);
        app.tick(&mut renderer).unwrap();
        assert!(app.bar.is_ended());
        assert_eq!(app.bar.transform(), None);
        assert_eq!(app.reveal.fired_at(RevealEvent::BarEnded), Some(0.5));
        assert_eq!(app.overlay.float(ALPHA), Ok(1.0));

        // Still inside the one second fade delay
        time.set(1.4);
        app.tick(&mut renderer).unwrap();
        assert_eq!(app.overlay.float(ALPHA), Ok(1.0));

        time.set(3.0);
        app.tick(&mut renderer).unwrap();
        let alpha = app.overlay.float(ALPHA).unwrap();
        assert!(alpha > 0.0 && alpha < 1.0, "mid fade alpha {}", alpha);

        time.set(4.5);
        app.tick(&mut renderer).unwrap();
        assert_eq!(app.overlay.float(ALPHA), Ok(0.0));
        assert!(app.reveal.is_done());
    }

    #[test]
    fn test_failed_asset_counts_as_loaded_by_default() {
        let time = ManualTime::new();
        let mut app = context(&time, LagoonConfig::default());

        app.track_asset("ship.gltf");
        app.apply_asset_result(failed("ship.gltf"));

        let events = app.load_events();
        assert!(events.contains(&LoadEvent::Error {
            url: "ship.gltf".to_string()
        }));
        assert_eq!(events.last(), Some(&LoadEvent::Completed));
        assert!(app.model.is_none());
    }

    #[test]
    fn test_failed_asset_blocks_when_configured() {
        let time = ManualTime::new();
        let mut config = LagoonConfig::default();
        config.loading.failure_policy = LoadFailurePolicy::Block;
        let mut app = context(&time, config);

        app.track_asset("ship.gltf");
        app.apply_asset_result(failed("ship.gltf"));

        assert!(!app.load_events().contains(&LoadEvent::Completed));
        assert_eq!(
            app.load_events().last(),
            Some(&LoadEvent::Progress {
                url: "ship.gltf".into(),
                items_loaded: 0,
                items_total: 1,
            })
        );
        assert!(!app.reveal.is_started());
        assert_eq!(app.overlay.float(ALPHA), Ok(1.0));
    }

    #[test]
    fn test_missing_asset_dir_still_completes() {
        let time = ManualTime::new();
        let mut config = LagoonConfig::default();
        config.assets_dir = std::env::temp_dir().join("lagoon-missing-assets");
        let mut app = context(&time, config);
        let mut renderer = NullRenderer::default();

        app.request_assets();
        for _ in 0..200 {
            app.tick(&mut renderer).unwrap();
            if app.manager.is_completed() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        assert!(app.manager.is_completed());
        assert!(app
            .load_events()
            .iter()
            .any(|e| matches!(e, LoadEvent::Error { .. })));
    }
}
