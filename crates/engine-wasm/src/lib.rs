use wasm_bindgen::prelude::*;

use markup3d_lib::command::execute_json;
use markup3d_lib::harness::TestHarness;
use markup3d_lib::loader::{LoadError, UploadTicket};
use markup3d_lib::state::EditorSettings;
use shared::ModelNode;

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    let json = serde_json::to_string(value).map_err(js_err)?;
    js_sys::JSON::parse(&json).map_err(|_| JsError::new("JSON.parse failed"))
}

/// Редактор сцены для браузера: хост передаёт события как JSON-команды
/// и каждый кадр забирает мировые позиции аннотаций
#[wasm_bindgen]
pub struct WasmEditor {
    harness: TestHarness,
}

#[wasm_bindgen]
impl WasmEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmEditor {
        WasmEditor {
            harness: TestHarness::with_settings(EditorSettings::default()),
        }
    }

    /// Создаёт редактор с настройками из JSON
    pub fn with_settings(settings_json: &str) -> Result<WasmEditor, JsError> {
        let settings: EditorSettings = serde_json::from_str(settings_json).map_err(js_err)?;
        Ok(WasmEditor {
            harness: TestHarness::with_settings(settings),
        })
    }

    /// Выполняет одну команду, возвращает CommandResponse в JSON
    pub fn execute(&mut self, command_json: &str) -> Result<String, JsError> {
        let response = execute_json(&mut self.harness, command_json).map_err(|e| JsError::new(&e))?;
        serde_json::to_string(&response).map_err(js_err)
    }

    /// Снимок аннотаций для текущего кадра
    pub fn frame(&self) -> Result<JsValue, JsError> {
        to_js(&self.harness.frame())
    }

    /// Флаги режимов для панели инструментов
    pub fn mode_flags(&self) -> Result<JsValue, JsError> {
        to_js(&self.harness.editor.mode_flags())
    }

    /// Подсказка для текущего режима
    pub fn hint(&self) -> Option<String> {
        self.harness.editor.hint().map(str::to_string)
    }

    /// Забирает накопленные уведомления
    pub fn notices(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.harness.editor.drain_notices())
    }

    /// Регистрирует загрузку файла. Для неподдерживаемого формата билета нет.
    pub fn upload(&mut self, file_name: &str) -> Option<u32> {
        match self.harness.editor.begin_upload(file_name) {
            Some(ticket) => u32::try_from(ticket.0).ok(),
            None => {
                web_sys::console::warn_1(&format!("Unsupported file type: {file_name}").into());
                None
            }
        }
    }

    /// Результат загрузки: граф модели в JSON. Возвращает id нового объекта.
    pub fn finish_upload(&mut self, ticket: u32, model_json: &str) -> Option<String> {
        let result = serde_json::from_str::<ModelNode>(model_json).map_err(|e| LoadError::Failed {
            file: format!("upload #{ticket}"),
            reason: e.to_string(),
        });
        let id = self
            .harness
            .editor
            .finish_upload(UploadTicket(u64::from(ticket)), result);
        if id.is_none() {
            web_sys::console::warn_1(&format!("Could not load upload #{ticket}").into());
        }
        id
    }

    /// Загрузчик хоста сообщил об ошибке
    pub fn fail_upload(&mut self, ticket: u32, message: &str) {
        web_sys::console::warn_1(&format!("Could not load upload #{ticket}: {message}").into());
        self.harness.editor.finish_upload(
            UploadTicket(u64::from(ticket)),
            Err(LoadError::Failed {
                file: format!("upload #{ticket}"),
                reason: message.to_string(),
            }),
        );
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new()
    }
}
