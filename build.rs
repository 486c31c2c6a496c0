fn main() {
    println!("cargo:rerun-if-env-changed=SOILWATCH_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SOILWATCH_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=SOILWATCH_MQTT_USER");
    println!("cargo:rerun-if-env-changed=SOILWATCH_MQTT_KEY");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
