use chronotope_renderer::{MemorySymbolStore, RenderConfig, render_graphml, validate_xml};
use serde::Deserialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChronotopeRenderOptions {
    #[serde(flatten)]
    config: RenderConfig,
    /// Symbol artwork keyed by symbol reference, e.g. `colour/road.svg`.
    #[serde(default)]
    symbols: BTreeMap<String, String>,
}

fn build_symbol_store(symbols: BTreeMap<String, String>) -> MemorySymbolStore {
    symbols
        .into_iter()
        .fold(MemorySymbolStore::new(), |store, (name, svg)| store.with(name, svg))
}

#[wasm_bindgen]
pub fn render_chronotope_svg(graphml: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<ChronotopeRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        ChronotopeRenderOptions::default()
    };

    let config = options.config.sanitized();
    let symbols = build_symbol_store(options.symbols);
    render_graphml(graphml, &config, &symbols).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Validation findings as a JSON array.
#[wasm_bindgen]
pub fn validate_chronotope_xml(xml: &str) -> Result<String, JsValue> {
    serde_json::to_string(&validate_xml(xml)).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use chronotope_renderer::{MemorySymbolStore, render_graphml};

    use crate::{ChronotopeRenderOptions, build_symbol_store};

    #[test]
    fn renders_with_inline_options_and_symbols() {
        let graphml = r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="t" for="node" attr.name="type"/>
  <graph>
    <node id="Inn"><data key="t">parlour</data><data key="x">0</data><data key="y">0</data></node>
    <node id="Gate"><data key="t">threshold</data><data key="x">5</data><data key="y">9</data></node>
    <edge source="Inn" target="Gate"><data key="relation">jump</data></edge>
  </graph>
</graphml>"#;

        let options: ChronotopeRenderOptions = serde_json::from_str(
            r#"{"colorScheme": "print", "curved": false,
                "symbols": {"greyscale/parlour.svg": "<svg xmlns=\"http://www.w3.org/2000/svg\"/>"}}"#,
        )
        .expect("options should parse");
        assert!(!options.config.curved);

        let store: MemorySymbolStore = build_symbol_store(options.symbols);
        let svg = render_graphml(graphml, &options.config, &store).expect("graph should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Inn"));
        assert_eq!(svg.matches("<image").count(), 1);
    }
}
