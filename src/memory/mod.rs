pub mod mpmc_ring;
