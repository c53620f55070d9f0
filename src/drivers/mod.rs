pub mod charger;
