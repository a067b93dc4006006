use std::collections::BTreeMap;
use std::rc::Rc;

use layout_snap::config::parse_config;
use layout_snap::dump::{CommitDump, FrameDump};
use layout_snap::{
    EngineConfig, LiveBridge, ManualScheduler, Rect, Scene, SnapResult, SpatialIndex, Subscription,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    // A second module instance on the same page finds the logger already set.
    let _ = console_log::init_with_level(log::Level::Warn);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundsView {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl From<Rect> for BoundsView {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.left,
            y: rect.top,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Host-independent half of [`EditorSession`]; everything here speaks plain
/// strings so it runs outside a JS engine too.
struct Session {
    scheduler: ManualScheduler,
    bridge: LiveBridge,
    subscriptions: BTreeMap<u32, Subscription>,
    next_subscription: u32,
}

impl Session {
    fn open(scene_json: &str, config_json: Option<&str>) -> Result<Self, String> {
        let config = match config_json {
            Some(raw) => parse_config(raw).map_err(|error| error.to_string())?,
            None => EngineConfig::default(),
        };
        let scene = Scene::from_json(scene_json).map_err(|error| error.to_string())?;
        let index = SpatialIndex::build(&scene, &config.index);
        let scheduler = ManualScheduler::new();
        let bridge = LiveBridge::new(index, config, Rc::new(scheduler.clone()));
        Ok(Self {
            scheduler,
            bridge,
            subscriptions: BTreeMap::new(),
            next_subscription: 1,
        })
    }

    fn subscribe_with(&mut self, mut sink: impl FnMut(String) + 'static) -> u32 {
        let backend = self.bridge.backend_name();
        let subscription = self.bridge.subscribe(move |frame| {
            match serde_json::to_string(&FrameDump::from_frame(frame, backend)) {
                Ok(json) => sink(json),
                Err(error) => log::error!("frame serialization failed: {error}"),
            }
        });
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscriptions.insert(id, subscription);
        id
    }

    fn unsubscribe(&mut self, id: u32) {
        if let Some(subscription) = self.subscriptions.remove(&id) {
            subscription.unsubscribe();
        }
    }

    fn end_drag(&self) -> Result<Option<String>, String> {
        self.bridge
            .end_drag()
            .map(|commit| serde_json::to_string(&CommitDump::from(&commit)))
            .transpose()
            .map_err(|error| error.to_string())
    }

    fn bounds(&self, element: &str) -> Result<Option<String>, String> {
        self.bridge
            .get_bounds(element)
            .map(|rect| serde_json::to_string(&BoundsView::from(rect)))
            .transpose()
            .map_err(|error| error.to_string())
    }

    fn snap_targets(&self, element: &str, rect: Rect) -> Result<Option<String>, String> {
        self.bridge
            .get_snap_targets(element, rect.left, rect.top, rect.width, rect.height)
            .map(|result: SnapResult| serde_json::to_string(&result))
            .transpose()
            .map_err(|error| error.to_string())
    }
}

/// One editing session. The host drives frames from its animation loop by
/// calling `frame(timestamp)`; subscribers receive each published frame as
/// JSON.
#[wasm_bindgen]
pub struct EditorSession {
    session: Session,
}

#[wasm_bindgen]
impl EditorSession {
    #[wasm_bindgen(constructor)]
    pub fn new(scene_json: &str, config_json: Option<String>) -> Result<EditorSession, JsValue> {
        let session = Session::open(scene_json, config_json.as_deref()).map_err(to_js)?;
        Ok(EditorSession { session })
    }

    #[wasm_bindgen(js_name = beginDrag)]
    pub fn begin_drag(&self, element: &str) -> bool {
        self.session.bridge.begin_drag(element)
    }

    #[wasm_bindgen(js_name = updateDrag)]
    pub fn update_drag(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.session.bridge.update_drag(x, y, width, height)
    }

    /// Commit JSON (`element`, `rect`, `displacement`) or `undefined` when no
    /// drag was active.
    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&self) -> Result<Option<String>, JsValue> {
        self.session.end_drag().map_err(to_js)
    }

    #[wasm_bindgen(js_name = cancelDrag)]
    pub fn cancel_drag(&self) {
        self.session.bridge.cancel_drag();
    }

    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self, element: &str) -> Result<Option<String>, JsValue> {
        self.session.bounds(element).map_err(to_js)
    }

    #[wasm_bindgen(js_name = getSnapTargets)]
    pub fn get_snap_targets(
        &self,
        element: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<Option<String>, JsValue> {
        self.session
            .snap_targets(element, Rect::new(x, y, width, height))
            .map_err(to_js)
    }

    /// Advances one frame; returns how many frame callbacks ran.
    pub fn frame(&self, timestamp: f64) -> u32 {
        self.session.scheduler.run_frame(timestamp) as u32
    }

    pub fn subscribe(&mut self, callback: js_sys::Function) -> u32 {
        self.session.subscribe_with(move |json| {
            if let Err(error) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                log::warn!("frame subscriber threw: {error:?}");
            }
        })
    }

    pub fn unsubscribe(&mut self, id: u32) {
        self.session.unsubscribe(id);
    }
}

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use layout_snap::Rect;

    use crate::Session;

    const SCENE: &str = r#"{
        "containers": [{
            "id": "page",
            "width": 800,
            "height": 600,
            "children": [
                {"id": "a", "style": {"left": "0px", "top": "0px", "width": "100px", "height": "50px"}},
                {"id": "b", "style": {"left": "300px", "top": "200px", "width": "100px", "height": "50px"}}
            ]
        }]
    }"#;

    #[test]
    fn drag_publishes_frames_to_subscribers() {
        let mut session = Session::open(SCENE, None).expect("scene should load");
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = frames.clone();
        let id = session.subscribe_with(move |json| sink.borrow_mut().push(json));

        assert!(session.bridge.begin_drag("b"));
        session.bridge.update_drag(104.0, 200.0, 100.0, 50.0);
        assert_eq!(session.scheduler.run_frame(16.0), 1);

        let last: serde_json::Value =
            serde_json::from_str(frames.borrow().last().expect("a frame")).unwrap();
        assert_eq!(last["drag"]["x"], 100.0);
        assert_eq!(last["drag"]["guides"][0]["orientation"], "vertical");

        session.unsubscribe(id);
        session.unsubscribe(id);
        assert_eq!(session.scheduler.run_frame(32.0), 0);
    }

    #[test]
    fn end_drag_serializes_commit() {
        let session = Session::open(SCENE, None).unwrap();
        assert_eq!(session.end_drag().unwrap(), None);
        session.bridge.begin_drag("b");
        session.bridge.update_drag(50.0, 10.0, 100.0, 50.0);
        let commit: serde_json::Value =
            serde_json::from_str(&session.end_drag().unwrap().unwrap()).unwrap();
        assert_eq!(commit["element"], "b");
        assert!(commit["displacement"]["a"].is_object());
    }

    #[test]
    fn queries_return_json() {
        let session = Session::open(SCENE, Some(r#"{"snap": {"threshold": 4}}"#)).unwrap();
        let bounds: serde_json::Value =
            serde_json::from_str(&session.bounds("a").unwrap().unwrap()).unwrap();
        assert_eq!(bounds["width"], 100.0);
        assert_eq!(session.bounds("missing").unwrap(), None);

        let near = session
            .snap_targets("b", Rect::new(305.0, 203.0, 100.0, 50.0))
            .unwrap()
            .unwrap();
        let near: serde_json::Value = serde_json::from_str(&near).unwrap();
        // Right edge sits 5px from the container center, outside a 4px threshold.
        assert_eq!(near["x"], 305.0);
    }

    #[test]
    fn bad_scene_is_an_error() {
        assert!(Session::open("not a scene", None).is_err());
        assert!(Session::open(SCENE, Some("{\"snap\": 3}")).is_err());
    }
}
