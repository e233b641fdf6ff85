//! Print a jet lag plan for a New York to Paris trip

fn main() {
    let json = r#"{
        "from_offset": "UTC-5",
        "to_offset": "UTC+1",
        "departure_date": "2024-06-10",
        "departure_time": "19:30",
        "arrival_date": "2024-06-11",
        "arrival_time": "08:45"
    }"#;

    match sleep_calc::jet_lag_plan_json(json) {
        Ok(plan) => print!("{plan}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
