// Tiga Watch — Chat Radio
//
// Brings up Wi-Fi in station mode (no association) so ESP-NOW can run, and
// forwards every received payload into the UI event channel.  The receive
// callback runs on the Wi-Fi task; it does nothing but send.

use std::sync::mpsc::Sender;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::espnow::EspNow;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};

use tiga::events::UiEvent;

/// Keeps the Wi-Fi driver and the ESP-NOW registration alive.
pub struct ChatRadio {
    _wifi: EspWifi<'static>,
    _espnow: EspNow<'static>,
}

pub fn start(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    ui_tx: Sender<UiEvent>,
) -> anyhow::Result<ChatRadio> {
    let mut wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
    wifi.start()?;

    let espnow = EspNow::take()?;
    espnow.register_recv_cb(move |_info, data| {
        let _ = ui_tx.send(UiEvent::MessageReceived(data.to_vec()));
    })?;

    log::info!("ESP-NOW chat radio ready");
    Ok(ChatRadio {
        _wifi: wifi,
        _espnow: espnow,
    })
}
