pub mod feature_vector;
pub mod grid_cell;
pub mod location;
pub mod meteo_conditions;
pub mod station_id;
