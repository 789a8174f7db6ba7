//! Attesting-chain (EVM) client.
//!
//! All contract addresses except the booking escrow are resolved once
//! at connect time through the on-chain contract registry, which lives
//! at the same address on every Flare network. Providers are built per
//! call; only resolved addresses are kept.

use std::str::FromStr;

use alloy::primitives::{Address, FixedBytes, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ChainConfig;
use crate::oracle::{feed_id, FeedObservation, FeedSource};
use crate::{Error, Result};

/// Registry name of the price oracle contract.
const REGISTRY_FTSO: &str = "FtsoV2";

/// Registry name of the payment verification contract.
const REGISTRY_FDC: &str = "FdcVerification";

sol! {
    #[sol(rpc)]
    interface IFlareContractRegistry {
        function getContractAddressByName(string memory _name) external view returns (address);
    }
}

sol! {
    /// One published oracle feed.
    struct FeedData {
        uint32 votingRoundId;
        bytes21 id;
        int32 value;
        uint16 turnoutBIPS;
        int8 decimals;
    }

    #[sol(rpc)]
    interface IFtsoV2 {
        function getFeedById(bytes21 _feedId) external view returns (FeedData memory);
    }
}

// Payment attestation structs and the verification interface share one
// block so they can reference each other.
sol! {
    /// Request body of a payment attestation.
    struct PaymentRequestBody {
        bytes32 transactionId;
        uint256 inUtxo;
        uint256 utxo;
    }

    /// Response body of a payment attestation.
    struct PaymentResponseBody {
        uint64 blockNumber;
        uint64 blockTimestamp;
        bytes32 sourceAddressHash;
        bytes32 sourceAddressesRoot;
        bytes32 receivingAddressHash;
        bytes32 intendedReceivingAddressHash;
        int256 spentAmount;
        int256 intendedSpentAmount;
        int256 receivedAmount;
        int256 intendedReceivedAmount;
        bytes32 standardPaymentReference;
        bool oneToOne;
        uint8 status;
    }

    /// Full attestation response.
    struct PaymentResponse {
        bytes32 attestationType;
        bytes32 sourceId;
        uint64 votingRound;
        uint64 lowestUsedTimestamp;
        PaymentRequestBody requestBody;
        PaymentResponseBody responseBody;
    }

    /// Merkle proof wrapping an attestation response.
    struct PaymentProof {
        bytes32[] merkleProof;
        PaymentResponse data;
    }

    #[sol(rpc)]
    interface IFdcVerification {
        function getCurrentVotingRoundId() external view returns (uint32);
        function verifyPayment(PaymentProof calldata _proof) external view returns (bool _proved);
    }
}

sol! {
    /// Listed property, as the booking escrow reports it.
    struct PropertyInfo {
        uint256 id;
        address host;
        uint256 pricePerNightUsd;
        bool active;
    }

    /// Recorded booking, as the booking escrow reports it.
    struct BookingInfo {
        uint256 id;
        uint256 propertyId;
        address guest;
        uint256 checkIn;
        uint256 checkOut;
        uint256 amountPaid;
        uint8 status;
    }

    #[sol(rpc)]
    interface IBookingEscrow {
        function getProperty(uint256 _propertyId) external view returns (PropertyInfo memory);
        function getBooking(uint256 _bookingId) external view returns (BookingInfo memory);
        function getUserBookings(address _user) external view returns (uint256[] memory);
        function getPropertyPrice(uint256 _propertyId) external view returns (uint256);
        function createBooking(uint256 _propertyId, uint256 _checkIn, uint256 _checkOut) external payable returns (uint256);
        function completeBooking(uint256 _bookingId) external;
    }
}

/// Read access to the attesting chain, as the attestation pipeline
/// needs it.
#[async_trait]
pub trait AttestingChain: Send + Sync {
    /// Current block number.
    async fn block_number(&self) -> Result<u64>;

    /// Current attestation voting round.
    async fn voting_round(&self) -> Result<u32>;

    /// Verify a payment attestation proof.
    async fn verify_payment_proof(&self, proof: PaymentProof) -> Result<bool>;
}

/// Client for the attesting chain.
///
/// Cheap to share: holds only the RPC endpoint and resolved contract
/// addresses.
#[derive(Debug, Clone)]
pub struct ChainClient {
    rpc_url: String,
    ftso_address: Address,
    fdc_address: Address,
    booking_address: Option<Address>,
}

impl ChainClient {
    /// Connect to the chain and resolve contract addresses through the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns `Error::Chain` if an address in the configuration does
    /// not parse or the registry cannot be queried.
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        let rpc_url = config.endpoint();
        let registry_address = Address::from_str(&config.registry_address)
            .map_err(|e| Error::Chain(format!("invalid registry address: {e}")))?;
        let booking_address = match &config.booking_contract {
            Some(addr) => Some(
                Address::from_str(addr)
                    .map_err(|e| Error::Chain(format!("invalid booking contract address: {e}")))?,
            ),
            None => None,
        };

        let provider = build_provider(&rpc_url)?;
        let registry = IFlareContractRegistry::new(registry_address, provider);
        let ftso_address = registry
            .getContractAddressByName(REGISTRY_FTSO.to_string())
            .call()
            .await
            .map_err(|e| Error::Chain(format!("registry lookup of {REGISTRY_FTSO} failed: {e}")))?;
        let fdc_address = registry
            .getContractAddressByName(REGISTRY_FDC.to_string())
            .call()
            .await
            .map_err(|e| Error::Chain(format!("registry lookup of {REGISTRY_FDC} failed: {e}")))?;

        info!(
            network = ?config.network,
            ftso = %ftso_address,
            fdc = %fdc_address,
            "connected to attesting chain"
        );
        Ok(Self {
            rpc_url,
            ftso_address,
            fdc_address,
            booking_address,
        })
    }

    fn provider(&self) -> Result<impl Provider + Clone> {
        build_provider(&self.rpc_url)
    }

    /// Current block number.
    ///
    /// # Errors
    ///
    /// Returns `Error::Chain` on RPC failure.
    pub async fn block_number(&self) -> Result<u64> {
        let provider = self.provider()?;
        provider
            .get_block_number()
            .await
            .map_err(|e| Error::Chain(format!("block number query failed: {e}")))
    }

    /// Read one oracle feed by symbol.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unencodable symbol and
    /// `Error::Chain` on RPC failure.
    pub async fn read_feed(&self, symbol: &str) -> Result<FeedObservation> {
        let id = feed_id(symbol)?;
        let provider = self.provider()?;
        let ftso = IFtsoV2::new(self.ftso_address, provider);
        let feed = ftso
            .getFeedById(FixedBytes::from(id))
            .call()
            .await
            .map_err(|e| Error::Chain(format!("feed read for {symbol} failed: {e}")))?;
        debug!(
            %symbol,
            round = feed.votingRoundId,
            value = feed.value,
            decimals = feed.decimals,
            "oracle feed read"
        );
        Ok(FeedObservation {
            voting_round: feed.votingRoundId,
            mantissa: feed.value,
            decimals: feed.decimals,
        })
    }

    /// Current attestation voting round.
    ///
    /// # Errors
    ///
    /// Returns `Error::Chain` on RPC failure.
    pub async fn voting_round(&self) -> Result<u32> {
        let provider = self.provider()?;
        let fdc = IFdcVerification::new(self.fdc_address, provider);
        fdc.getCurrentVotingRoundId()
            .call()
            .await
            .map_err(|e| Error::Chain(format!("voting round query failed: {e}")))
    }

    /// Verify a payment attestation proof against the chain.
    ///
    /// # Errors
    ///
    /// Returns `Error::Chain` on RPC failure; the boolean is the
    /// contract's own verdict.
    pub async fn verify_payment_proof(&self, proof: PaymentProof) -> Result<bool> {
        let provider = self.provider()?;
        let fdc = IFdcVerification::new(self.fdc_address, provider);
        fdc.verifyPayment(proof)
            .call()
            .await
            .map_err(|e| Error::Chain(format!("proof verification failed: {e}")))
    }

    fn booking_address(&self) -> Result<Address> {
        self.booking_address
            .ok_or_else(|| Error::Config("no booking contract configured".to_string()))
    }

    /// Fetch a listed property from the booking escrow.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` without a configured booking contract
    /// and `Error::Chain` on RPC failure.
    pub async fn property(&self, property_id: u64) -> Result<PropertyInfo> {
        let address = self.booking_address()?;
        let provider = self.provider()?;
        let escrow = IBookingEscrow::new(address, provider);
        escrow
            .getProperty(U256::from(property_id))
            .call()
            .await
            .map_err(|e| Error::Chain(format!("property {property_id} query failed: {e}")))
    }

    /// Per-night USD price of a property, as published by the escrow.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` without a configured booking contract
    /// and `Error::Chain` on RPC failure.
    pub async fn property_price(&self, property_id: u64) -> Result<U256> {
        let address = self.booking_address()?;
        let provider = self.provider()?;
        let escrow = IBookingEscrow::new(address, provider);
        escrow
            .getPropertyPrice(U256::from(property_id))
            .call()
            .await
            .map_err(|e| Error::Chain(format!("price query for {property_id} failed: {e}")))
    }

    /// Booking ids recorded for a wallet.
    ///
    /// # Errors
    ///
    /// Returns `Error::Chain` for a bad wallet address or RPC failure
    /// and `Error::Config` without a configured booking contract.
    pub async fn user_bookings(&self, wallet: &str) -> Result<Vec<u64>> {
        let address = self.booking_address()?;
        let user = Address::from_str(wallet)
            .map_err(|e| Error::Chain(format!("invalid wallet address: {e}")))?;
        let provider = self.provider()?;
        let escrow = IBookingEscrow::new(address, provider);
        let ids = escrow
            .getUserBookings(user)
            .call()
            .await
            .map_err(|e| Error::Chain(format!("booking list query failed: {e}")))?;
        Ok(ids
            .into_iter()
            .map(|id| u64::try_from(id).unwrap_or(u64::MAX))
            .collect())
    }

    /// ABI-encoded calldata for `createBooking`. Signing and
    /// submission belong to the caller's wallet.
    #[must_use]
    pub fn create_booking_calldata(property_id: u64, check_in: u64, check_out: u64) -> Vec<u8> {
        IBookingEscrow::createBookingCall {
            _propertyId: U256::from(property_id),
            _checkIn: U256::from(check_in),
            _checkOut: U256::from(check_out),
        }
        .abi_encode()
    }

    /// ABI-encoded calldata for `completeBooking`.
    #[must_use]
    pub fn complete_booking_calldata(booking_id: u64) -> Vec<u8> {
        IBookingEscrow::completeBookingCall {
            _bookingId: U256::from(booking_id),
        }
        .abi_encode()
    }
}

#[async_trait]
impl FeedSource for ChainClient {
    async fn fetch(&self, symbol: &str) -> Result<FeedObservation> {
        self.read_feed(symbol).await
    }

    async fn current_round(&self) -> Result<u32> {
        self.voting_round().await
    }
}

#[async_trait]
impl AttestingChain for ChainClient {
    async fn block_number(&self) -> Result<u64> {
        Self::block_number(self).await
    }

    async fn voting_round(&self) -> Result<u32> {
        Self::voting_round(self).await
    }

    async fn verify_payment_proof(&self, proof: PaymentProof) -> Result<bool> {
        Self::verify_payment_proof(self, proof).await
    }
}

fn build_provider(rpc_url: &str) -> Result<impl Provider + Clone> {
    let url = rpc_url
        .parse()
        .map_err(|e| Error::Chain(format!("invalid RPC URL {rpc_url}: {e}")))?;
    Ok(ProviderBuilder::new().connect_http(url))
}
