#![no_main]

use libfuzzer_sys::fuzz_target;
use storycheck::{AssetHandle, PromptComposer};

fuzz_target!(|data: &[u8]| {
    if let Ok(template) = std::str::from_utf8(data) {
        let mut handle = AssetHandle::new("fuzz.zip");
        handle.assign_remote("files/fuzz");
        handle.mark_active("https://store.invalid/v1beta/files/fuzz");
        let assets = vec![handle];
        // Composition should never panic, whatever the template holds
        let _ = PromptComposer::new(&assets).compose(Some(template), "story", None);
    }
});
